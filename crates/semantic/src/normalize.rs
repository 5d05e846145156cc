/// Scale `v` to unit length. Zero vectors are left as they are.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return;
    }
    v.iter_mut().for_each(|x| *x /= norm);
}

/// Canonical form of a query before embedding: trimmed, lowercased and
/// cut to `max_chars` characters.
pub fn prepare_query(text: &str, max_chars: usize) -> String {
    text.trim().to_lowercase().chars().take(max_chars).collect()
}
