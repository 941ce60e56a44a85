//! Water vapor absorption.

/// One water vapor line of the Rosenkranz (1998) model.
#[derive(Debug, Clone, Copy)]
struct VaporLine {
    /// Line center in GHz
    f0: f64,
    /// Line intensity at 300 K
    intensity: f64,
    /// Temperature coefficient of the intensity
    intensity_exp: f64,
    /// Air-broadened width at 300 K
    air_width: f64,
    /// Temperature exponent of the air broadening
    air_width_exp: f64,
    /// Self-broadened width at 300 K
    self_width: f64,
    /// Temperature exponent of the self broadening
    self_width_exp: f64,
}

impl VaporLine {
    const fn new(
        f0: f64,
        intensity: f64,
        intensity_exp: f64,
        air_width: f64,
        air_width_exp: f64,
        self_width: f64,
        self_width_exp: f64,
    ) -> Self {
        Self {
            f0,
            intensity,
            intensity_exp,
            air_width,
            air_width_exp,
            self_width,
            self_width_exp,
        }
    }
}

#[allow(clippy::excessive_precision)]
#[rustfmt::skip]
const LINES: [VaporLine; 15] = [
    VaporLine::new(22.2351, 0.1310e-13, 2.144, 0.0281, 0.69, 0.1349, 0.61),
    VaporLine::new(183.3101, 0.2273e-11, 0.668, 0.0281, 0.64, 0.1491, 0.85),
    VaporLine::new(321.2256, 0.8036e-13, 6.179, 0.023, 0.67, 0.108, 0.54),
    VaporLine::new(325.1529, 0.2694e-11, 1.541, 0.0278, 0.68, 0.135, 0.74),
    VaporLine::new(380.1974, 0.2438e-10, 1.048, 0.0287, 0.54, 0.1541, 0.89),
    VaporLine::new(439.1508, 0.2179e-11, 3.595, 0.021, 0.63, 0.090, 0.52),
    VaporLine::new(443.0183, 0.4624e-12, 5.048, 0.0186, 0.60, 0.0788, 0.50),
    VaporLine::new(448.0011, 0.2562e-10, 1.405, 0.0263, 0.66, 0.1275, 0.67),
    VaporLine::new(470.8890, 0.8369e-12, 3.597, 0.0215, 0.66, 0.0983, 0.65),
    VaporLine::new(474.6891, 0.3263e-11, 2.379, 0.0236, 0.65, 0.1095, 0.64),
    VaporLine::new(488.4911, 0.6659e-12, 2.852, 0.026, 0.69, 0.1313, 0.72),
    VaporLine::new(556.9360, 0.1531e-08, 0.159, 0.0321, 0.69, 0.1320, 1.0),
    VaporLine::new(620.7008, 0.1707e-10, 2.391, 0.0244, 0.71, 0.1140, 0.68),
    VaporLine::new(752.0332, 0.1011e-08, 0.396, 0.0306, 0.68, 0.1253, 0.84),
    VaporLine::new(916.1712, 0.4227e-10, 1.441, 0.0267, 0.70, 0.1275, 0.78),
];

/// Modified version of the Rosenkranz water vapor model.
///
/// For a total pressure `p` in hPa, temperature `t` in K, water vapor pressure
/// `pv` in hPa, and frequency `freq` in GHz, compute the water vapor absorption
/// coefficient in dB/km.
///
/// From: P.W. Rosenkranz, Radio Science v.33, pp.919-928 (1998), with the
/// 22 GHz line width and shape and the continuum adjusted by Frank Wentz.
pub(super) fn rosenkranz_1998(p: f64, t: f64, pv: f64, freq: f64) -> f64 {
    #![allow(clippy::excessive_precision)]

    if pv <= 0. {
        return 0.;
    }

    let pwet = 0.1 * pv;
    let pdry = 0.1 * p - pwet;
    let tht = 300. / t;
    let xterm = 1. - tht;
    let freq_sq = freq.powi(2);

    let sum: f64 = LINES
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let f0sq = line.f0.powi(2);
            let self_ratio = line.self_width / line.air_width;
            let air_width = if i == 0 {
                line.air_width / 1.040
            } else {
                line.air_width
            };
            let ga = air_width
                * (pdry * tht.powf(line.air_width_exp)
                    + self_ratio * pwet * tht.powf(line.self_width_exp));
            let ga_sq = ga.powi(2);
            let s = 1.8281089e14 * line.intensity / f0sq * f64::exp(line.intensity_exp * xterm);
            let rnuneg = line.f0 - freq;
            let rnupos = line.f0 + freq;

            // Clough's definition of the local line contribution
            let base = ga / (562_500. + ga_sq);

            if i != 0 {
                let mut sum = 0.;
                if rnuneg.abs() < 750. {
                    sum += s * (ga / (ga_sq + rnuneg.powi(2)) - base);
                }
                if rnupos.abs() <= 750. {
                    sum += s * (ga / (ga_sq + rnupos.powi(2)) - base);
                }
                sum
            } else {
                // The 22 GHz line gets a modified line shape below 19 GHz
                let chi = if freq < 19. {
                    let u = f64::clamp((freq - 19.).abs() / 16.5, 0., 1.);
                    0.07 * ga + 0.93 * ga * u.powi(2) * (3. - 2. * u)
                } else {
                    0.07 * ga
                };

                let chi_sq = chi.powi(2);
                s * 2. * ((ga - chi) * freq_sq + (ga + chi) * (f0sq + ga_sq - chi_sq))
                    / ((freq_sq - f0sq - ga_sq + chi_sq).powi(2) + 4. * freq_sq * ga_sq)
            }
        })
        .sum();
    let sum = sum.max(0.);

    let ffac = if freq < 90. {
        1. + 0.1 * ((90. - freq) / 90.).powf(1.4)
    } else {
        1.
    };

    // Continuum
    let sftot = pwet
        * freq
        * tht.powf(3.5)
        * (sum
            + ffac * 1.1 * 1.2957246e-6 * pdry / tht.sqrt()
            + 0.348 * freq.powf(0.15) * 4.2952193e-5 * pwet * tht.powi(4));

    0.1820 * freq * sftot
}
