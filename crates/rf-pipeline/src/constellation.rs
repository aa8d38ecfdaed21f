use num_complex::Complex32;
use rf_estimators::ModulationKind;

/// Supported modulation orders for the decision stage
/// (SPEC_FULL.md §4.4). QPSK is the default fallback for any name this
/// doesn't recognize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Modulation {
    Bpsk,
    Qpsk,
    Psk8,
    Qam16,
}

impl Modulation {
    /// Parse a modulation name, falling back to QPSK for anything
    /// unrecognized (SPEC_FULL.md §4.4: "QPSK is default fallback").
    pub fn parse(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("bpsk") {
            Modulation::Bpsk
        } else if lower.contains("8psk") || lower.contains("psk8") {
            Modulation::Psk8
        } else if lower.contains("16qam") || lower.contains("qam16") {
            Modulation::Qam16
        } else {
            Modulation::Qpsk
        }
    }

    /// Whether the Costas loop should run its BPSK phase detector rather
    /// than QPSK (SPEC_FULL.md §4.4: "mode BPSK if modulation begins with
    /// 'bpsk', else QPSK").
    pub fn is_bpsk_name(name: &str) -> bool {
        name.to_ascii_lowercase().starts_with("bpsk")
    }

    pub fn kappa_kind(self) -> ModulationKind {
        match self {
            Modulation::Bpsk | Modulation::Qpsk | Modulation::Psk8 => ModulationKind::Psk,
            Modulation::Qam16 => ModulationKind::Qam16,
        }
    }

    /// Unit-average-power constellation points.
    pub fn points(self) -> Vec<Complex32> {
        match self {
            Modulation::Bpsk => vec![Complex32::new(1.0, 0.0), Complex32::new(-1.0, 0.0)],
            Modulation::Qpsk => {
                let s = std::f32::consts::FRAC_1_SQRT_2;
                vec![
                    Complex32::new(s, s),
                    Complex32::new(-s, s),
                    Complex32::new(-s, -s),
                    Complex32::new(s, -s),
                ]
            }
            Modulation::Psk8 => (0..8)
                .map(|k| {
                    let angle = 2.0 * std::f32::consts::PI * k as f32 / 8.0;
                    Complex32::new(angle.cos(), angle.sin())
                })
                .collect(),
            Modulation::Qam16 => {
                let levels = [-3.0_f32, -1.0, 1.0, 3.0];
                let norm = 10.0_f32.sqrt();
                let mut points = Vec::with_capacity(16);
                for &i in &levels {
                    for &q in &levels {
                        points.push(Complex32::new(i / norm, q / norm));
                    }
                }
                points
            }
        }
    }
}
