/// Bucket index for a page with `free_space` bytes free, under `h` equal-width
/// buckets spanning `[0, max_object_size]`.
pub fn bucket_for_free_space(free_space: usize, h: usize, max_object_size: usize) -> usize {
    if h <= 1 || max_object_size == 0 {
        return 0;
    }
    let idx = free_space.saturating_mul(h - 1) / max_object_size;
    idx.min(h - 1)
}

/// Smallest bucket index that could possibly hold a page fitting
/// `bytes_required` more bytes. If this exceeds `h - 1`, no bucket can
/// possibly satisfy the request and the scan can be skipped entirely.
pub fn min_bucket_required(bytes_required: usize, h: usize, max_object_size: usize) -> usize {
    if h == 0 {
        return 0;
    }
    if max_object_size == 0 {
        return h;
    }
    let numerator = bytes_required.saturating_mul(h - 1);
    numerator.div_ceil(max_object_size) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_for_free_space_is_clamped_to_last_bucket() {
        assert_eq!(bucket_for_free_space(1000, 10, 100), 9);
        assert_eq!(bucket_for_free_space(0, 10, 100), 0);
    }

    #[test]
    fn min_bucket_required_rules_out_impossible_requests() {
        let h = 10;
        let max_object_size = 100;
        // requesting more than max_object_size is never satisfiable
        assert!(min_bucket_required(max_object_size + 1, h, max_object_size) >= h);
    }
}
