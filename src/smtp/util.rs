use rand::{Rng, distributions::Alphanumeric};

const SYNTHETIC_LOCAL_LEN: usize = 20;

/// Local part that no real mailbox is expected to use.
pub(crate) fn random_local_part() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SYNTHETIC_LOCAL_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_local_part_shape() {
        let a = random_local_part();
        let b = random_local_part();
        assert_eq!(a.len(), 20);
        assert!(a.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_ne!(a, b);
    }
}
