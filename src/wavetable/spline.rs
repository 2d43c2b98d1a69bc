//! Cubic spline interpolation over uniformly spaced knots

/// Not-a-knot cubic spline through `n` values placed at `i / (n - 1)` on [0, 1]
#[derive(Debug, Clone)]
pub struct CubicSpline {
    values: Vec<f64>,
    /// Second derivatives at each knot
    moments: Vec<f64>,
    step: f64,
}

impl CubicSpline {
    /// Fit a spline. At least four values are needed for the not-a-knot end
    /// conditions; fewer than two values cannot be interpolated at all.
    pub fn new(values: &[f64]) -> Option<Self> {
        let n = values.len();
        if n < 2 {
            return None;
        }
        let step = 1.0 / (n - 1) as f64;
        let moments = if n < 4 {
            vec![0.0; n]
        } else {
            not_a_knot_moments(values, step)
        };
        Some(Self {
            values: values.to_vec(),
            moments,
            step,
        })
    }

    /// Evaluate at `x`; points outside [0, 1] extrapolate the end pieces
    pub fn eval(&self, x: f64) -> f64 {
        let h = self.step;
        let last = self.values.len() - 2;
        let k = ((x / h).floor().max(0.0) as usize).min(last);

        let x0 = k as f64 * h;
        let x1 = x0 + h;
        let (y0, y1) = (self.values[k], self.values[k + 1]);
        let (m0, m1) = (self.moments[k], self.moments[k + 1]);

        let a = x1 - x;
        let b = x - x0;
        m0 * a * a * a / (6.0 * h)
            + m1 * b * b * b / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * a
            + (y1 / h - m1 * h / 6.0) * b
    }
}

/// Solve for knot second derivatives with not-a-knot end conditions.
///
/// With uniform spacing the end conditions give `M0 = 2*M1 - M2` (and the
/// mirror at the far end), which turns the first and last interior equations
/// into `6h * M = rhs`; the rest is a plain tridiagonal system.
fn not_a_knot_moments(y: &[f64], h: f64) -> Vec<f64> {
    let n = y.len();
    let interior = n - 2;
    let rhs: Vec<f64> = (1..n - 1)
        .map(|i| 6.0 * ((y[i + 1] - y[i]) / h - (y[i] - y[i - 1]) / h))
        .collect();

    let mut lower = vec![h; interior];
    let mut diag = vec![4.0 * h; interior];
    let mut upper = vec![h; interior];
    diag[0] = 6.0 * h;
    upper[0] = 0.0;
    diag[interior - 1] = 6.0 * h;
    lower[interior - 1] = 0.0;

    let solved = solve_tridiagonal(&lower, &diag, &upper, &rhs);

    let mut moments = Vec::with_capacity(n);
    let first = if interior >= 2 {
        2.0 * solved[0] - solved[1]
    } else {
        solved[0]
    };
    moments.push(first);
    moments.extend_from_slice(&solved);
    let last = if interior >= 2 {
        2.0 * solved[interior - 1] - solved[interior - 2]
    } else {
        solved[0]
    };
    moments.push(last);
    moments
}

/// Thomas algorithm; `lower[0]` and `upper[n-1]` are ignored
fn solve_tridiagonal(lower: &[f64], diag: &[f64], upper: &[f64], rhs: &[f64]) -> Vec<f64> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    c[0] = upper[0] / diag[0];
    d[0] = rhs[0] / diag[0];
    for i in 1..n {
        let denom = diag[i] - lower[i] * c[i - 1];
        c[i] = upper[i] / denom;
        d[i] = (rhs[i] - lower[i] * d[i - 1]) / denom;
    }

    let mut x = vec![0.0; n];
    x[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d[i] - c[i] * x[i + 1];
    }
    x
}
