//! Signal conditioning: detrend, taper and Butterworth filtering

use std::f64::consts::PI;

/// Remove the least-squares straight line (and therefore the mean)
pub fn detrend(data: &mut [f64]) {
    let n = data.len();
    if n < 2 {
        if let Some(x) = data.first_mut() {
            *x = 0.0;
        }
        return;
    }

    let nf = n as f64;
    let t_mean = (nf - 1.0) / 2.0;
    let y_mean = data.iter().sum::<f64>() / nf;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in data.iter().enumerate() {
        let dt = i as f64 - t_mean;
        num += dt * (y - y_mean);
        den += dt * dt;
    }
    let slope = num / den;

    for (i, y) in data.iter_mut().enumerate() {
        *y -= y_mean + slope * (i as f64 - t_mean);
    }
}

/// Symmetric cosine (Tukey) taper over `fraction` of the samples at each end
pub fn cosine_taper(data: &mut [f64], fraction: f64) {
    let n = data.len();
    let width = ((n as f64) * fraction).floor() as usize;
    if width < 2 || n < 2 * width {
        return;
    }

    for i in 0..width {
        let w = 0.5 * (1.0 - (PI * i as f64 / width as f64).cos());
        data[i] *= w;
        data[n - 1 - i] *= w;
    }
}

/// Filter response type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Highpass,
    Lowpass,
}

/// Second-order section in transposed direct form II (first-order when b2 = a2 = 0)
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    fn second_order(kind: FilterKind, w0: f64, q: f64) -> Self {
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;
        let (b0, b1, b2) = match kind {
            FilterKind::Lowpass => ((1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0),
            FilterKind::Highpass => ((1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0),
        };
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    fn first_order(kind: FilterKind, w0: f64) -> Self {
        let k = (w0 / 2.0).tan();
        let norm = 1.0 / (1.0 + k);
        let (b0, b1) = match kind {
            FilterKind::Lowpass => (k * norm, k * norm),
            FilterKind::Highpass => (norm, -norm),
        };
        Self {
            b0,
            b1,
            b2: 0.0,
            a1: (k - 1.0) * norm,
            a2: 0.0,
        }
    }

    fn process(&self, data: &mut [f64]) {
        let mut z1 = 0.0;
        let mut z2 = 0.0;
        for x in data.iter_mut() {
            let input = *x;
            let y = self.b0 * input + z1;
            z1 = self.b1 * input - self.a1 * y + z2;
            z2 = self.b2 * input - self.a2 * y;
            *x = y;
        }
    }
}

/// Butterworth filter as a cascade of second-order sections
#[derive(Debug, Clone)]
pub struct Butterworth {
    sections: Vec<Biquad>,
}

impl Butterworth {
    /// Design a filter; `None` if the corner is not strictly between 0 and Nyquist
    pub fn new(kind: FilterKind, corner_hz: f64, sample_rate: f64, order: usize) -> Option<Self> {
        let nyquist = 0.5 * sample_rate;
        if !(corner_hz > 0.0 && corner_hz < nyquist) || order == 0 {
            return None;
        }

        let w0 = 2.0 * PI * corner_hz / sample_rate;
        let mut sections: Vec<Biquad> = (0..order / 2)
            .map(|k| {
                let theta = PI * (2 * k + 1) as f64 / (2 * order) as f64;
                Biquad::second_order(kind, w0, 1.0 / (2.0 * theta.sin()))
            })
            .collect();
        if order % 2 == 1 {
            sections.push(Biquad::first_order(kind, w0));
        }

        Some(Self { sections })
    }

    /// Causal filtering in place
    pub fn apply(&self, data: &mut [f64]) {
        for section in &self.sections {
            section.process(data);
        }
    }

    /// Forward-backward filtering in place (zero phase, squared magnitude)
    pub fn apply_zero_phase(&self, data: &mut [f64]) {
        self.apply(data);
        data.reverse();
        self.apply(data);
        data.reverse();
    }
}

/// Design and apply a Butterworth filter; returns false if the corner is unusable
pub fn butterworth(
    data: &mut [f64],
    kind: FilterKind,
    corner_hz: f64,
    sample_rate: f64,
    order: usize,
    zero_phase: bool,
) -> bool {
    match Butterworth::new(kind, corner_hz, sample_rate, order) {
        Some(filter) => {
            if zero_phase {
                filter.apply_zero_phase(data);
            } else {
                filter.apply(data);
            }
            true
        }
        None => false,
    }
}
