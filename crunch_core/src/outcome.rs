use crate::error::Error;

/// Byte counts for one successful codec operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub bytes_in: u32,
    pub bytes_out: u32,
}

impl Stats {
    /// Build stats from raw byte counts, saturating at `u32::MAX` rather
    /// than wrapping for oversized files.
    pub fn new(bytes_in: u64, bytes_out: u64) -> Self {
        Self {
            bytes_in: u32::try_from(bytes_in).unwrap_or(u32::MAX),
            bytes_out: u32::try_from(bytes_out).unwrap_or(u32::MAX),
        }
    }
}

/// Uniform result contract returned by every dispatch operation.
///
/// `error == 0` means success; any negative value is a specific failure
/// code (see [`crate::error`]). The command adapter translates this struct
/// into a command response and telemetry, so it must always be produced:
/// the dispatch layer folds every [`Error`] into the `error` field and
/// never panics or returns `Err` across that boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub bytes_in: u32,
    pub bytes_out: u32,
    pub error: i32,
}

impl Outcome {
    pub fn success(stats: Stats) -> Self {
        Self {
            bytes_in: stats.bytes_in,
            bytes_out: stats.bytes_out,
            error: 0,
        }
    }

    /// Failure outcome. Byte counts are zeroed; the adapter does not read
    /// them when `error != 0`.
    pub fn failure(error: &Error) -> Self {
        Self {
            bytes_in: 0,
            bytes_out: 0,
            error: error.code(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error == 0
    }

    /// Compression ratio as the adapter derives it: `bytes_out / bytes_in`,
    /// defined as 0 when `bytes_in` is 0.
    pub fn ratio(&self) -> f32 {
        if self.bytes_in == 0 {
            return 0.0;
        }
        self.bytes_out as f32 / self.bytes_in as f32
    }
}

impl From<Result<Stats, Error>> for Outcome {
    fn from(result: Result<Stats, Error>) -> Self {
        match result {
            Ok(stats) => Outcome::success(stats),
            Err(err) => Outcome::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HuffmanError;

    #[test]
    fn ratio_is_zero_for_empty_input() {
        let outcome = Outcome::success(Stats::new(0, 10));
        assert_eq!(outcome.ratio(), 0.0);
    }

    #[test]
    fn ratio_divides_out_by_in() {
        let outcome = Outcome::success(Stats::new(200, 50));
        assert!((outcome.ratio() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn stats_saturate_instead_of_wrapping() {
        let stats = Stats::new(u64::from(u32::MAX) + 1, 1);
        assert_eq!(stats.bytes_in, u32::MAX);
        assert_eq!(stats.bytes_out, 1);
    }

    #[test]
    fn failure_carries_the_variant_code() {
        let err = Error::Huffman(HuffmanError::BadHeader);
        let outcome = Outcome::failure(&err);
        assert_eq!(outcome.error, -3);
        assert!(!outcome.is_success());
    }
}
