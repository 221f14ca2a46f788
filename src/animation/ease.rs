/// Cubic ease-out of normalized progress `t`, clamped to `[0, 1]`.
pub fn out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}
