//! CPU-bound workload shared by the demo suites and the benchmark

/// The `n`th prime, by trial division
pub fn compute_large_prime(n: u32) -> u64 {
    let mut count = 0;
    let mut candidate: u64 = 1;
    while count < n {
        candidate += 1;
        if is_prime(candidate) {
            count += 1;
        }
    }
    candidate
}

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut divisor = 2;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_large_prime() {
        assert_eq!(compute_large_prime(0), 1);
        assert_eq!(compute_large_prime(1), 2);
        assert_eq!(compute_large_prime(5), 11);
        assert_eq!(compute_large_prime(1000), 7919);
    }
}
