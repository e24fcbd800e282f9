use chrono::{NaiveDate, NaiveTime, Timelike};

/// `19:05` -> `7:05 PM`.
pub fn format_time_12h(time: NaiveTime) -> String {
    let (pm, hour) = time.hour12();
    let suffix = if pm { "PM" } else { "AM" };
    format!("{hour}:{:02} {suffix}", time.minute())
}

pub fn format_time_range(start: NaiveTime, end: NaiveTime) -> String {
    format!("{} - {}", format_time_12h(start), format_time_12h(end))
}

/// Rupee amount with Indian digit grouping, e.g. `₹1,23,456.50`.
pub fn format_inr(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}₹{}.{fraction}", group_indian(whole))
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (more, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = more;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

/// `10 March 2025`.
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

/// `turf-wise` -> `Turf-wise`, `padel` -> `Padel`.
pub fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
