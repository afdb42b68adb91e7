// src/pipeline/stages/size.rs

use tracing::info;

use crate::pipeline::asset::Asset;
use crate::pipeline::stage::{Stage, StageFuture, StageOutput};

/// Logs the aggregate size of everything passing through; assets are
/// forwarded unchanged.
#[derive(Debug, Clone)]
pub struct SizeReport {
    title: String,
}

impl SizeReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Stage for SizeReport {
    fn name(&self) -> &str {
        "size"
    }

    fn apply(&self, assets: Vec<Asset>) -> StageFuture<'_> {
        Box::pin(async move {
            let total: usize = assets.iter().map(Asset::len).sum();
            info!(
                title = %self.title,
                files = assets.len(),
                bytes = total,
                "{} all files {}",
                self.title,
                format_size(total as u64)
            );
            Ok(StageOutput::new(assets))
        })
    }
}

/// Human-readable size with three significant digits, decimal units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["kB", "MB", "GB", "TB"];

    if bytes < 1000 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = "B";
    for candidate in UNITS {
        if value < 1000.0 {
            break;
        }
        value /= 1000.0;
        unit = candidate;
    }

    if value < 10.0 {
        format!("{value:.2} {unit}")
    } else if value < 100.0 {
        format!("{value:.1} {unit}")
    } else {
        format!("{value:.0} {unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::format_size;

    #[test]
    fn formats_like_pretty_bytes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(999), "999 B");
        assert_eq!(format_size(1234), "1.23 kB");
        assert_eq!(format_size(45_600), "45.6 kB");
        assert_eq!(format_size(2_500_000), "2.50 MB");
    }
}
