use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::booking::{Booking, BookingDomain, BookingStatus};
use crate::calendar::{DayCell, MonthGrid, WEEKDAY_LABELS};
use crate::config::Config;
use crate::format::{capitalize, format_inr, format_long_date, format_time_12h, format_time_range};
use crate::overlay::BookingDetail;

const CHIP_NAME_WIDTH: usize = 24;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, grid), fields(month = %grid.title()))]
    pub fn print_month_grid(&self, grid: &MonthGrid) -> anyhow::Result<()> {
        self.write_month_grid(io::stdout().lock(), grid)
    }

    /// Six week rows under a Sun..Sat header, then the month's bookings as chips.
    pub fn write_month_grid<W: Write>(&self, mut out: W, grid: &MonthGrid) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&grid.title(), "1"))?;
        writeln!(out)?;

        let headers = WEEKDAY_LABELS.iter().map(|l| l.to_string()).collect();
        let rows = grid
            .weeks()
            .map(|week| week.iter().map(|cell| self.day_label(cell)).collect())
            .collect();
        write_table(&mut out, headers, rows)?;

        let occupied: Vec<&DayCell> = grid
            .cells
            .iter()
            .filter(|c| c.in_current_month && c.has_bookings())
            .collect();

        writeln!(out)?;
        if occupied.is_empty() {
            writeln!(out, "No bookings this month.")?;
            return Ok(());
        }

        for cell in occupied {
            writeln!(out, "{}", self.paint(&cell.date.format("%a %d").to_string(), "1"))?;
            for booking in &cell.bookings {
                writeln!(out, "  {}", self.chip(booking))?;
            }
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, fields(title = %detail.title))]
    pub fn print_booking_detail(&self, detail: &BookingDetail) -> anyhow::Result<()> {
        self.write_booking_detail(io::stdout().lock(), detail)
    }

    pub fn write_booking_detail<W: Write>(
        &self,
        mut out: W,
        detail: &BookingDetail,
    ) -> anyhow::Result<()> {
        let label_width = detail
            .rows
            .iter()
            .map(|r| UnicodeWidthStr::width(r.label))
            .max()
            .unwrap_or(0);

        writeln!(
            out,
            "{}  {}",
            self.paint(&detail.title, "1"),
            self.paint(&detail.status, status_code_for_label(&detail.status))
        )?;
        for row in &detail.rows {
            writeln!(out, "  {:label_width$}  {}", row.label, row.value)?;
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(count = bookings.len()))]
    pub fn print_booking_table(&self, bookings: &[&Booking]) -> anyhow::Result<()> {
        self.write_booking_table(io::stdout().lock(), bookings)
    }

    pub fn write_booking_table<W: Write>(
        &self,
        mut out: W,
        bookings: &[&Booking],
    ) -> anyhow::Result<()> {
        let headers = [
            "ID", "Date", "Time", "Customer", "Team", "Category", "Advance", "Pending", "Status",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();

        let rows = bookings
            .iter()
            .map(|booking| {
                vec![
                    self.paint(&booking.id, "33"),
                    booking.date.format("%Y-%m-%d").to_string(),
                    format_time_range(booking.start_time, booking.end_time),
                    booking.customer_name.clone(),
                    booking.team_name.clone(),
                    capitalize(booking.category_label()),
                    format_inr(booking.advance_amount),
                    booking
                        .pending_amount
                        .map(format_inr)
                        .unwrap_or_else(|| "-".to_string()),
                    self.paint(booking.status.as_key(), status_code(booking.status)),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        writeln!(out)?;
        let noun = if bookings.len() == 1 { "booking" } else { "bookings" };
        writeln!(out, "{} {noun}", bookings.len())?;
        Ok(())
    }

    pub fn print_create_hint(&self, domain: BookingDomain, date: NaiveDate) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "No bookings on {}.", format_long_date(date))?;
        writeln!(
            out,
            "Create one with: courtside --domain {} book --date {} --start HH:MM --end HH:MM --name NAME --phone PHONE",
            domain.as_key(),
            date.format("%Y-%m-%d")
        )?;
        Ok(())
    }

    pub fn print_config(&self, cfg: &Config) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        for file in &cfg.loaded_files {
            writeln!(out, "# loaded {}", file.display())?;
        }
        for (key, value) in cfg.iter() {
            let shown = if key == "api.session" && !value.is_empty() {
                "********"
            } else {
                value.as_str()
            };
            writeln!(out, "{key} = {shown}")?;
        }
        Ok(())
    }

    pub fn print_message(&self, message: &str) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{message}")?;
        Ok(())
    }

    fn day_label(&self, cell: &DayCell) -> String {
        let number = cell.date.format("%e").to_string().trim().to_string();
        let marker = match cell.bookings.len() {
            0 => String::new(),
            1 => "*".to_string(),
            n => format!("[{n}]"),
        };
        let label = format!("{number}{marker}");

        if cell.is_today {
            self.paint(&label, "7")
        } else if !cell.in_current_month {
            self.paint(&label, "2")
        } else if cell.has_bookings() {
            self.paint(&label, "32")
        } else {
            label
        }
    }

    fn chip(&self, booking: &Booking) -> String {
        format!(
            "{:>8}  {}  {}",
            format_time_12h(booking.start_time),
            truncate_width(&booking.customer_name, CHIP_NAME_WIDTH),
            self.paint(&format!("[{}]", booking.id), "33")
        )
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn status_code(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Confirmed => "32",
        BookingStatus::Pending => "33",
        BookingStatus::Cancelled => "31",
        BookingStatus::Completed => "34",
    }
}

fn status_code_for_label(label: &str) -> &'static str {
    label
        .parse::<BookingStatus>()
        .map(status_code)
        .unwrap_or("0")
}

fn truncate_width(text: &str, max: usize) -> String {
    if UnicodeWidthStr::width(text) <= max {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, &width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for &width in &widths {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, &width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::BookingIndex;
    use crate::test_support::{day, turf_booking};

    fn render_grid(bookings: &[Booking]) -> String {
        let index = BookingIndex::build(bookings);
        let grid = MonthGrid::build(day("2025-03-01"), day("2025-03-15"), &index);
        let mut buf = Vec::new();
        Renderer::plain()
            .write_month_grid(&mut buf, &grid)
            .expect("render grid");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn grid_marks_occupied_days_and_lists_chips() {
        let bookings = vec![
            turf_booking("a", "2025-03-10"),
            turf_booking("b", "2025-03-10"),
            turf_booking("c", "2025-03-11"),
        ];
        let text = render_grid(&bookings);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "March 2025");
        assert!(lines[2].starts_with("Sun"));
        // header, rule and six weeks
        assert!(lines[4].starts_with("23 "));
        assert!(text.contains("10[2]"));
        assert!(text.contains("11*"));
        assert!(text.contains("Mon 10"));
        assert!(text.contains("6:00 PM  customer a  [a]"));
    }

    #[test]
    fn empty_month_says_so() {
        let text = render_grid(&[]);
        assert!(text.contains("No bookings this month."));
    }

    #[test]
    fn table_counts_rows() {
        let bookings = [turf_booking("a", "2025-03-10")];
        let refs: Vec<&Booking> = bookings.iter().collect();
        let mut buf = Vec::new();
        Renderer::plain()
            .write_booking_table(&mut buf, &refs)
            .expect("render table");
        let text = String::from_utf8(buf).expect("utf8");

        assert!(text.contains("Turf-wise"));
        assert!(text.contains("₹2,000.00"));
        assert!(text.trim_end().ends_with("1 booking"));
    }

    #[test]
    fn truncates_long_names_by_display_width() {
        assert_eq!(truncate_width("short", 10), "short");
        assert_eq!(truncate_width("abcdefghij", 5), "abcd…");
        assert_eq!(strip_ansi("\x1b[32mok\x1b[0m"), "ok");
    }
}
