//! Oxygen absorption.

/// One oxygen line of the Liebe, Rosenkranz and Hufford (1992) model.
#[derive(Debug, Clone, Copy)]
struct OxygenLine {
    /// Line center in GHz
    f0: f64,
    /// Line strength at 300 K, scaled by the line frequency below
    strength: f64,
    /// Temperature exponent of the strength
    strength_exp: f64,
    /// Pressure-broadened width in GHz/kPa
    width: f64,
    /// Temperature exponent offset of the width
    width_exp: f64,
    /// Line mixing, in units of 1e-3/kPa
    mixing: f64,
    /// Temperature coefficient of the line mixing, in units of 1e-3/kPa
    mixing_temp: f64,
}

impl OxygenLine {
    const fn new(
        f0: f64,
        strength: f64,
        strength_exp: f64,
        width: f64,
        width_exp: f64,
        mixing: f64,
        mixing_temp: f64,
    ) -> Self {
        Self {
            f0,
            strength,
            strength_exp,
            width,
            width_exp,
            mixing,
            mixing_temp,
        }
    }
}

/// The 60 GHz band plus the 118 GHz line and the submillimeter lines.
#[allow(clippy::excessive_precision)]
#[rustfmt::skip]
const LINES: [OxygenLine; 44] = [
    OxygenLine::new(50.474238, 0.94e-6, 9.694, 8.60e-3, 0., 0.210, 0.685),
    OxygenLine::new(50.987749, 2.46e-6, 8.694, 8.70e-3, 0., 0.190, 0.680),
    OxygenLine::new(51.503350, 6.08e-6, 7.744, 8.90e-3, 0., 0.171, 0.673),
    OxygenLine::new(52.021410, 14.14e-6, 6.844, 9.20e-3, 0., 0.144, 0.664),
    OxygenLine::new(52.542394, 31.02e-6, 6.004, 9.40e-3, 0., 0.118, 0.653),
    OxygenLine::new(53.066907, 64.10e-6, 5.224, 9.70e-3, 0., 0.114, 0.621),
    OxygenLine::new(53.595749, 124.70e-6, 4.484, 10.00e-3, 0., 0.200, 0.508),
    OxygenLine::new(54.130000, 228.00e-6, 3.814, 10.20e-3, 0., 0.291, 0.375),
    OxygenLine::new(54.671159, 391.80e-6, 3.194, 10.50e-3, 0., 0.325, 0.265),
    OxygenLine::new(55.221367, 631.60e-6, 2.624, 10.79e-3, 0., 0.224, 0.295),
    OxygenLine::new(55.783802, 953.50e-6, 2.119, 11.10e-3, 0., -0.144, 0.613),
    OxygenLine::new(56.264775, 548.90e-6, 0.015, 16.46e-3, 0., 0.339, -0.098),
    OxygenLine::new(56.363389, 1344.00e-6, 1.660, 11.44e-3, 0., -0.258, 0.655),
    OxygenLine::new(56.968206, 1763.00e-6, 1.260, 11.81e-3, 0., -0.362, 0.645),
    OxygenLine::new(57.612484, 2141.00e-6, 0.915, 12.21e-3, 0., -0.533, 0.606),
    OxygenLine::new(58.323877, 2386.00e-6, 0.626, 12.66e-3, 0., -0.178, 0.044),
    OxygenLine::new(58.446590, 1457.00e-6, 0.084, 14.49e-3, 0., 0.650, -0.127),
    OxygenLine::new(59.164207, 2404.00e-6, 0.391, 13.19e-3, 0., -0.628, 0.231),
    OxygenLine::new(59.590983, 2112.00e-6, 0.212, 13.60e-3, 0., 0.665, -0.078),
    OxygenLine::new(60.306061, 2124.00e-6, 0.212, 13.82e-3, 0., -0.613, 0.070),
    OxygenLine::new(60.434776, 2461.00e-6, 0.391, 12.97e-3, 0., 0.606, -0.282),
    OxygenLine::new(61.150560, 2504.00e-6, 0.626, 12.48e-3, 0., 0.090, -0.058),
    OxygenLine::new(61.800154, 2298.00e-6, 0.915, 12.07e-3, 0., 0.496, -0.662),
    OxygenLine::new(62.411215, 1933.00e-6, 1.260, 11.71e-3, 0., 0.313, -0.676),
    OxygenLine::new(62.486260, 1517.00e-6, 0.083, 14.68e-3, 0., -0.433, 0.084),
    OxygenLine::new(62.997977, 1503.00e-6, 1.665, 11.39e-3, 0., 0.208, -0.668),
    OxygenLine::new(63.568518, 1087.00e-6, 2.115, 11.08e-3, 0., 0.094, -0.614),
    OxygenLine::new(64.127767, 733.50e-6, 2.620, 10.78e-3, 0., -0.270, -0.289),
    OxygenLine::new(64.678903, 463.50e-6, 3.195, 10.50e-3, 0., -0.366, -0.259),
    OxygenLine::new(65.224071, 274.80e-6, 3.815, 10.20e-3, 0., -0.326, -0.368),
    OxygenLine::new(65.764772, 153.00e-6, 4.485, 10.00e-3, 0., -0.232, -0.500),
    OxygenLine::new(66.302091, 80.09e-6, 5.225, 9.70e-3, 0., -0.146, -0.609),
    OxygenLine::new(66.836830, 39.46e-6, 6.005, 9.40e-3, 0., -0.147, -0.639),
    OxygenLine::new(67.369598, 18.32e-6, 6.845, 9.20e-3, 0., -0.174, -0.647),
    OxygenLine::new(67.900867, 8.01e-6, 7.745, 8.90e-3, 0., -0.198, -0.655),
    OxygenLine::new(68.431005, 3.30e-6, 8.695, 8.70e-3, 0., -0.210, -0.660),
    OxygenLine::new(68.960311, 1.28e-6, 9.695, 8.60e-3, 0., -0.220, -0.665),
    OxygenLine::new(118.750343, 945.00e-6, 0.009, 16.30e-3, 0., -0.031, 0.008),
    OxygenLine::new(368.498350, 67.90e-6, 0.049, 19.20e-3, 0.6, 0.0, 0.0),
    OxygenLine::new(424.763124, 638.00e-6, 0.044, 19.16e-3, 0.6, 0.0, 0.0),
    OxygenLine::new(487.249370, 235.00e-6, 0.049, 19.20e-3, 0.6, 0.0, 0.0),
    OxygenLine::new(715.393150, 99.60e-6, 0.145, 18.10e-3, 0.6, 0.0, 0.0),
    OxygenLine::new(773.839675, 671.00e-6, 0.130, 18.10e-3, 0.6, 0.0, 0.0),
    OxygenLine::new(834.145330, 180.00e-6, 0.147, 18.10e-3, 0.6, 0.0, 0.0),
];

/// Modified version of the Liebe 1992 oxygen model.
///
/// For a total pressure `p` in hPa, temperature `t` in K, water vapor pressure
/// `pv` in hPa, and frequency `freq` in GHz, compute the oxygen absorption
/// coefficient in dB/km.
///
/// From: Atmospheric 60-GHz Oxygen Spectrum, Liebe, Rosenkranz, Hufford,
/// 1992, including the nonresonant term and the empirical high-frequency
/// correction added by Frank Wentz.
pub(super) fn liebe_1992(p: f64, t: f64, pv: f64, freq: f64) -> f64 {
    let tht = 300. / t;
    let pwet = 0.1 * pv;
    let pdry = 0.1 * p - pwet;
    let xterm = 1. - tht;

    let sum: f64 = LINES
        .iter()
        .map(|line| {
            let ga = line.width * (pdry * tht.powf(0.8 - line.width_exp) + 1.1 * tht * pwet);
            let delta = 1e-3 * (line.mixing + line.mixing_temp * tht) * p * tht.powf(0.8);
            let ga_sq = ga.powi(2);
            let rnuneg = line.f0 - freq;
            let rnupos = line.f0 + freq;

            let shape = (ga - rnuneg * delta) / (ga_sq + rnuneg.powi(2))
                + (ga - rnupos * delta) / (ga_sq + rnupos.powi(2));
            shape * line.strength / line.f0 * f64::exp(line.strength_exp * xterm)
        })
        .sum();
    let sum = sum.max(0.);

    // Nonresonant contribution
    let ga = 5.6e-3 * (pdry + 1.1 * pwet) * tht.powf(1.5);
    let zterm = ga * (1. + (freq / ga).powi(2));
    let apterm = (1.4e-10 * (1. - 1.2e-5 * freq.powf(1.5)) * pdry * tht.powf(1.5)).max(0.);
    let sftot = pdry * freq * tht.powi(2) * (tht * sum + 6.14e-4 / zterm + apterm);

    let gamoxy = 0.1820 * freq * sftot;
    if freq > 37. {
        gamoxy + 0.1820 * 26.0e-10 * pdry.powi(2) * tht.powi(3) * (freq - 37.).powf(1.8)
    } else {
        gamoxy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_sorted() {
        assert!(LINES.windows(2).all(|w| w[0].f0 < w[1].f0));
    }

    #[test]
    fn sixty_ghz_band_dominates() {
        let at = |freq| liebe_1992(1013.25, 288.15, 10., freq);
        let peak = at(60.);
        assert!((8. ..25.).contains(&peak), "{peak}");
        assert!(at(20.) < 0.1);
        assert!(at(118.75) > at(100.));
    }

    #[test]
    fn thins_out_with_pressure() {
        let surface = liebe_1992(1000., 280., 5., 23.8);
        let aloft = liebe_1992(300., 230., 0.1, 23.8);
        assert!(surface > aloft);
        assert!(aloft > 0.);
    }
}
