use std::io::{self, Write};
use std::time::Duration;

use async_trait::async_trait;

/// Text shown above the console's output.
pub const TAGLINE: &str =
    "Check if your system has any open attack surface, before any attacker does it.";

/// How static text is put on screen. The only contract is that the full text ends up
/// written within a bounded time.
#[async_trait]
pub trait Reveal: Send + Sync {
    async fn reveal(&self, text: &str, out: &mut (dyn Write + Send)) -> io::Result<()>;
}

/// Writes everything at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Instant;

#[async_trait]
impl Reveal for Instant {
    async fn reveal(&self, text: &str, out: &mut (dyn Write + Send)) -> io::Result<()> {
        out.write_all(text.as_bytes())?;
        out.flush()
    }
}

/// Writes one character at a time.
///
/// Characters are due at evenly spaced deadlines from the start, `delay` apart, squeezed
/// so the last one lands no later than `max_total`.
#[derive(Debug, Clone, Copy)]
pub struct Typewriter {
    pub delay: Duration,
    pub max_total: Duration,
}

impl Default for Typewriter {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(50),
            max_total: Duration::from_secs(5),
        }
    }
}

impl Typewriter {
    /// Time from the start until the last character is written.
    fn span(&self, chars: usize) -> Duration {
        let full = self
            .delay
            .checked_mul(u32::try_from(chars).unwrap_or(u32::MAX))
            .unwrap_or(Duration::MAX);
        full.min(self.max_total)
    }

    /// Offset of the `i`-th character (1-based) out of `chars`.
    fn due(&self, i: usize, chars: usize) -> Duration {
        let span = self.span(chars).as_nanos();
        let nanos = span * i as u128 / chars.max(1) as u128;
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl Reveal for Typewriter {
    async fn reveal(&self, text: &str, out: &mut (dyn Write + Send)) -> io::Result<()> {
        let chars = text.chars().count();
        let start = tokio::time::Instant::now();
        let mut buf = [0u8; 4];
        for (i, ch) in text.chars().enumerate() {
            tokio::time::sleep_until(start + self.due(i + 1, chars)).await;
            out.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
            out.flush()?;
        }
        Ok(())
    }
}
