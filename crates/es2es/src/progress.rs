//! 📊 progress.rs: "Are we there yet?" Every transfer, every time, forever.
//!
//! 🚀 This module answers the age-old question: "how fast are documents moving?"
//! With cold hard numbers, a progress bar, and a table so comfy it has lumbar support.
//!
//! ⚠️  Warning: Watching this progress bar will not make the scroll go faster.
//! Neither will refreshing it. We've tried. Science says no.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

// -- 📏 one mebibyte, not a megabyte, pedants. there's a difference and I will die on this hill.
const MIB: u64 = 1024 * 1024;

// -- 🔄 how far back the rate window looks
const RATE_WINDOW: Duration = Duration::from_secs(5);

/// 📦 Bytes, for humans. Because "1073741824 bytes" is a war crime in a UI.
pub(crate) fn format_bytes(bytes: u64) -> String {
    if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= 1024 {
        format!("{:.2} KiB", bytes as f64 / 1024.0)
    } else {
        // -- 🐛 raw bytes mode. small payloads need love too.
        format!("{} bytes", bytes)
    }
}

/// 🔢 Formats a number with commas for the 3 people in the audience who like readability.
/// "1000000 docs" → "1,000,000 docs". You're welcome, eyes.
pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ Formats a Duration into MM:SS or HH:MM:SS.
/// If it shows HH:MM:SS, you should probably call your mom. It's been a while.
pub(crate) fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 📡 Throughput at one moment. A speedometer for documents, minus the speeding tickets.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rates {
    docs_per_sec: f64,
    mib_per_sec: f64,
}

/// 🏁 What a finished transfer has to show for itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSummary {
    /// 📄 Pages submitted to the bulk endpoint. Empty pages don't count; they never left.
    pub pages: u64,
    pub documents: u64,
    /// 📦 Bytes of bulk payload sent to the destination.
    pub bulk_bytes: u64,
    pub elapsed: Duration,
}

impl TransferSummary {
    /// 🍽️ The end-credits table. Two columns, no borders, all the numbers.
    pub fn to_table(&self) -> Table {
        let docs_per_sec = if self.elapsed.as_secs_f64() > 0.0 {
            self.documents as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        };

        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        for (label, value) in [
            ("Documents", format_number(self.documents)),
            ("Pages", format_number(self.pages)),
            ("Bulk payload", format_bytes(self.bulk_bytes)),
            ("Elapsed", format_duration(self.elapsed)),
            ("Throughput", format!("{} Docs/s", format_number(docs_per_sec as u64))),
        ] {
            table.add_row(vec![Cell::new(label), Cell::new(value).set_alignment(CellAlignment::Right)]);
        }
        table
    }
}

/// 📊 The brains behind the progress display. Tracks documents, pages, bulk bytes, and your sanity.
///
/// Uses a sliding 5-second window for rate calculations so one slow scroll page doesn't
/// scare you. The document total is unknown until the first page tells us `hits.total`;
/// until then there's no percentage and no ETA, just vibes.
pub struct TransferProgress {
    /// 🏷️ "origin → destination", for the top line of the display
    label: String,
    /// 📏 0 means "no idea yet"
    total_docs: u64,
    docs: u64,
    pages: u64,
    bulk_bytes: u64,
    progress_bar: ProgressBar,
    /// 🔄 sliding window of (timestamp, bytes, docs)
    rate_samples: VecDeque<(Instant, u64, u64)>,
    start_time: Instant,
}

impl std::fmt::Debug for TransferProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("TransferProgress")
            .field("label", &self.label)
            .field("total_docs", &self.total_docs)
            .field("docs", &self.docs)
            .field("pages", &self.pages)
            .field("bulk_bytes", &self.bulk_bytes)
            .finish()
    }
}

impl TransferProgress {
    /// 🚀 A progress display drawn to the terminal. Not a terminal? indicatif stays quiet.
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_bar(label.into(), ProgressBar::new(0))
    }

    /// 🙈 Same bookkeeping, no drawing. For tests and for people who hate joy.
    pub fn hidden(label: impl Into<String>) -> Self {
        Self::with_bar(label.into(), ProgressBar::hidden())
    }

    fn with_bar(label: String, progress_bar: ProgressBar) -> Self {
        match ProgressStyle::default_bar().template("{msg}\n| [{bar:40.cyan/blue}]") {
            Ok(style) => progress_bar.set_style(style.progress_chars("=>-")),
            // -- 🐛 the template is hardcoded; if this ever fires, indicatif changed its grammar
            Err(e) => warn!("⚠️ Progress bar template rejected ({e}), falling back to the default look"),
        }

        let start_time = Instant::now();
        let mut rate_samples = VecDeque::new();
        rate_samples.push_back((start_time, 0u64, 0u64));

        Self {
            label,
            total_docs: 0,
            docs: 0,
            pages: 0,
            bulk_bytes: 0,
            progress_bar,
            rate_samples,
            start_time,
        }
    }

    /// 📏 Tell the display how many documents to expect. First answer wins.
    pub fn set_total(&mut self, total_docs: u64) {
        if self.total_docs == 0 && total_docs > 0 {
            self.total_docs = total_docs;
            self.progress_bar.set_length(total_docs);
        }
    }

    /// 🔄 One page made it to the destination. Count it, re-render, move the bar.
    pub fn record_page(&mut self, docs: u64, bulk_bytes: u64) {
        self.pages += 1;
        self.docs += docs;
        self.bulk_bytes += bulk_bytes;

        let rates = self.calculate_rates();
        self.render(rates);
        self.progress_bar.set_position(self.docs);
    }

    /// ✅ Close the bar and hand over the receipt.
    pub fn finish(&self) -> TransferSummary {
        self.progress_bar.finish();
        TransferSummary {
            pages: self.pages,
            documents: self.docs,
            bulk_bytes: self.bulk_bytes,
            elapsed: self.start_time.elapsed(),
        }
    }

    fn calculate_rates(&mut self) -> Rates {
        let now = Instant::now();
        // 🔄 evict samples older than the window. like a bouncer, but for data points
        while let Some(&(timestamp, _, _)) = self.rate_samples.front() {
            if now.duration_since(timestamp) > RATE_WINDOW {
                self.rate_samples.pop_front();
            } else {
                break;
            }
        }
        self.rate_samples.push_back((now, self.bulk_bytes, self.docs));

        if let Some(&(oldest_time, oldest_bytes, oldest_docs)) = self.rate_samples.front() {
            let elapsed = now.duration_since(oldest_time).as_secs_f64();
            if elapsed > 0.0 {
                let bytes_delta = self.bulk_bytes.saturating_sub(oldest_bytes);
                let docs_delta = self.docs.saturating_sub(oldest_docs);
                return Rates {
                    docs_per_sec: docs_delta as f64 / elapsed,
                    mib_per_sec: (bytes_delta as f64 / elapsed) / MIB as f64,
                };
            }
        }

        // -- 💤 not enough elapsed time yet. zeros, and maintain composure
        Rates {
            docs_per_sec: 0.0,
            mib_per_sec: 0.0,
        }
    }

    fn percent(&self) -> f64 {
        if self.total_docs > 0 {
            (self.docs as f64 / self.total_docs as f64) * 100.0
        } else {
            0.0
        }
    }

    /// 🎨 Render the display as a comfy-table message on the progress bar.
    ///
    /// ```text
    /// | transfer: <origin> → <destination>
    /// | [=====>----------]
    ///   <docs/s>     <docs / total>
    ///   <MiB/s>      <bulk bytes, pages>
    ///   <elapsed>    <remaining>
    /// ```
    fn render(&self, rates: Rates) {
        let percent = self.percent();
        let elapsed = self.start_time.elapsed();
        let remaining = if percent > 0.0 {
            // 🔮 linear extrapolation, assumes the future looks like the past
            let total_estimated = elapsed.as_secs_f64() / (percent / 100.0);
            let remaining_secs = total_estimated - elapsed.as_secs_f64();
            if remaining_secs > 0.0 {
                format_duration(Duration::from_secs_f64(remaining_secs))
            } else {
                "--:--".to_string()
            }
        } else {
            "--:--".to_string()
        };

        let docs_progress = if self.total_docs > 0 {
            format!(
                "{} / {} Docs ({:.2}%)",
                format_number(self.docs),
                format_number(self.total_docs),
                percent
            )
        } else {
            format!("{} Docs", format_number(self.docs))
        };

        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.add_row(vec![
            Cell::new(format!("{} Docs/s", format_number(rates.docs_per_sec as u64)))
                .set_alignment(CellAlignment::Right),
            Cell::new(docs_progress).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{:.2} MiB/s", rates.mib_per_sec)).set_alignment(CellAlignment::Right),
            Cell::new(format!(
                "{} in {} pages",
                format_bytes(self.bulk_bytes),
                format_number(self.pages)
            ))
            .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} elapsed", format_duration(elapsed))).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} remaining", remaining)).set_alignment(CellAlignment::Right),
        ]);

        self.progress_bar
            .set_message(format!("transfer: {}\n{}", self.label, table));
    }
}
