/// Scales `v` to unit length. Returns `false` and leaves `v` untouched when
/// the norm is zero or not finite.
pub(crate) fn l2_normalize_in_place(v: &mut [f64]) -> bool {
    let norm_sq: f64 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 && norm_sq.is_finite() {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
        true
    } else {
        false
    }
}
