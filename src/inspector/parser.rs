//! Parsers for the output of the built-in metric commands.
//!
//! Errors are plain strings; [`super::BuiltinInspector`] attaches the
//! metric name.

use super::Reading;

/// Parses `/proc/meminfo` lines (values in KiB).
pub fn parse_meminfo(output: &str) -> Result<Reading, String> {
    let mut total = None;
    let mut available = None;
    let mut free = None;
    let mut swap_total = None;
    let mut swap_free = None;

    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(kib) = value.parse::<u64>() else {
            continue;
        };
        match key {
            "MemTotal:" => total = Some(kib),
            "MemAvailable:" => available = Some(kib),
            "MemFree:" => free = Some(kib),
            "SwapTotal:" => swap_total = Some(kib),
            "SwapFree:" => swap_free = Some(kib),
            _ => {}
        }
    }

    let total = total.filter(|t| *t > 0).ok_or("missing MemTotal")?;
    // Older kernels have no MemAvailable.
    let available = available.or(free).ok_or("missing MemAvailable")?;
    let used = total.saturating_sub(available);
    let percent = used as f64 / total as f64 * 100.0;

    let mut reading = Reading::new(format!("{:.0}% of {}", percent, format_kib(total)))
        .with_gauge(percent)
        .with_field("Total", format_kib(total))
        .with_field("Used", format_kib(used))
        .with_field("Available", format_kib(available));

    if let (Some(swap_total), Some(swap_free)) = (swap_total, swap_free) {
        if swap_total > 0 {
            let swap_used = swap_total.saturating_sub(swap_free);
            reading = reading.with_field(
                "Swap",
                format!("{} / {}", format_kib(swap_used), format_kib(swap_total)),
            );
        }
    }

    Ok(reading)
}

/// Parses `df -Pk` output. The gauge is the fullest filesystem.
pub fn parse_df(output: &str) -> Result<Reading, String> {
    let mut mounts: Vec<(String, f64, u64)> = Vec::new();

    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 || parts[0] == "Filesystem" {
            continue;
        }
        let Ok(size_kib) = parts[1].parse::<u64>() else {
            continue;
        };
        let Ok(percent) = parts[4].trim_end_matches('%').parse::<f64>() else {
            continue;
        };
        mounts.push((parts[5..].join(" "), percent, size_kib));
    }

    let (fullest, percent, _) = mounts
        .iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .cloned()
        .ok_or("no filesystems in df output")?;

    let mut reading = Reading::new(format!("{:.0}% {}", percent, fullest)).with_gauge(percent);
    for (mount, percent, size_kib) in &mounts {
        reading = reading.with_field(
            mount.clone(),
            format!("{:.0}% of {}", percent, format_kib(*size_kib)),
        );
    }
    Ok(reading)
}

/// Parses `/proc/loadavg` (`0.10 0.20 0.30 1/123 4567`).
pub fn parse_loadavg(output: &str) -> Result<Reading, String> {
    let parts: Vec<&str> = output.split_whitespace().collect();
    if parts.len() < 3 {
        return Err("expected three load averages".to_string());
    }

    let mut loads = [0.0f64; 3];
    for (slot, raw) in loads.iter_mut().zip(&parts[..3]) {
        *slot = raw.parse().map_err(|_| format!("invalid load average `{}`", raw))?;
    }

    let mut reading = Reading::new(format!("{:.2} {:.2} {:.2}", loads[0], loads[1], loads[2]))
        .with_gauge(loads[0])
        .with_field("1 min", format!("{:.2}", loads[0]))
        .with_field("5 min", format!("{:.2}", loads[1]))
        .with_field("15 min", format!("{:.2}", loads[2]));

    if let Some((running, total)) = parts.get(3).and_then(|p| p.split_once('/')) {
        reading = reading.with_field("Tasks", format!("{} running / {}", running, total));
    }
    Ok(reading)
}

/// Parses `/proc/uptime` (seconds since boot, idle seconds).
pub fn parse_uptime(output: &str) -> Result<Reading, String> {
    let raw = output.split_whitespace().next().ok_or("empty output")?;
    let seconds: f64 = raw.parse().map_err(|_| format!("invalid uptime `{}`", raw))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("invalid uptime `{}`", raw));
    }

    let formatted = format_uptime(seconds as u64);
    Ok(Reading::new(formatted.clone())
        .with_field("Up", formatted)
        .with_field("Seconds", format!("{:.0}", seconds)))
}

/// Output of a user-supplied command, shown as-is.
pub fn parse_custom(output: &str) -> Reading {
    let trimmed = output.trim();
    let summary = trimmed.lines().next().unwrap_or("").to_string();
    let gauge = summary.parse::<f64>().ok().filter(|v| v.is_finite());

    let mut reading = Reading::new(summary);
    reading.gauge = gauge;
    for (index, line) in trimmed.lines().enumerate() {
        reading = reading.with_field(format!("{}", index + 1), line.to_string());
    }
    reading
}

fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

fn format_kib(kib: u64) -> String {
    const MIB: f64 = 1024.0;
    const GIB: f64 = 1024.0 * 1024.0;
    const TIB: f64 = 1024.0 * 1024.0 * 1024.0;

    let kib_f = kib as f64;
    if kib_f >= TIB {
        format!("{:.1}T", kib_f / TIB)
    } else if kib_f >= GIB {
        format!("{:.1}G", kib_f / GIB)
    } else if kib_f >= MIB {
        format!("{:.1}M", kib_f / MIB)
    } else {
        format!("{}K", kib)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meminfo() {
        let output = "MemTotal:       16000000 kB\n\
                      MemFree:         1000000 kB\n\
                      MemAvailable:    4000000 kB\n\
                      SwapTotal:       2000000 kB\n\
                      SwapFree:        1500000 kB\n";
        let reading = parse_meminfo(output).unwrap();
        assert!((reading.gauge.unwrap() - 75.0).abs() < 0.01);
        assert!(reading.summary.starts_with("75%"));
        assert!(reading.fields.iter().any(|(k, _)| k == "Swap"));
    }

    #[test]
    fn test_meminfo_falls_back_to_memfree() {
        let output = "MemTotal: 1000 kB\nMemFree: 250 kB\n";
        let reading = parse_meminfo(output).unwrap();
        assert!((reading.gauge.unwrap() - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_meminfo_missing_total() {
        assert!(parse_meminfo("MemFree: 10 kB\n").is_err());
    }

    #[test]
    fn test_df() {
        let output = "Filesystem     1024-blocks      Used Available Capacity Mounted on\n\
                      /dev/sda1        100000000  50000000  50000000      50% /\n\
                      /dev/sdb1         20000000  18000000   2000000      90% /var/lib/data\n";
        let reading = parse_df(output).unwrap();
        assert_eq!(reading.gauge, Some(90.0));
        assert_eq!(reading.summary, "90% /var/lib/data");
        assert_eq!(reading.fields.len(), 2);
        assert_eq!(reading.fields[0].0, "/");
    }

    #[test]
    fn test_df_mount_with_spaces() {
        let output = "/dev/sdc1 1000 10 990 1% /media/My Disk\n";
        let reading = parse_df(output).unwrap();
        assert_eq!(reading.fields[0].0, "/media/My Disk");
    }

    #[test]
    fn test_df_empty() {
        assert!(parse_df("Filesystem 1024-blocks Used Available Capacity Mounted on\n").is_err());
    }

    #[test]
    fn test_loadavg() {
        let reading = parse_loadavg("0.52 0.58 0.59 3/467 12345\n").unwrap();
        assert_eq!(reading.summary, "0.52 0.58 0.59");
        assert_eq!(reading.gauge, Some(0.52));
        assert!(reading.fields.iter().any(|(k, v)| k == "Tasks" && v == "3 running / 467"));
    }

    #[test]
    fn test_loadavg_invalid() {
        assert!(parse_loadavg("0.5 0.6").is_err());
        assert!(parse_loadavg("a b c").is_err());
    }

    #[test]
    fn test_uptime() {
        let reading = parse_uptime("93784.12 12345.00\n").unwrap();
        assert_eq!(reading.summary, "1d 2h 3m");
        assert!(reading.gauge.is_none());
        assert_eq!(parse_uptime("59.0 1.0").unwrap().summary, "0m");
        assert_eq!(parse_uptime("3700 1.0").unwrap().summary, "1h 1m");
    }

    #[test]
    fn test_uptime_invalid() {
        assert!(parse_uptime("").is_err());
        assert!(parse_uptime("-5 0").is_err());
    }

    #[test]
    fn test_custom() {
        let reading = parse_custom("42\nsecond line\n");
        assert_eq!(reading.summary, "42");
        assert_eq!(reading.gauge, Some(42.0));
        assert_eq!(reading.fields.len(), 2);

        let text = parse_custom("web-1.example.com\n");
        assert!(text.gauge.is_none());
        assert_eq!(parse_custom("").summary, "");
    }

    #[test]
    fn test_format_kib() {
        assert_eq!(format_kib(512), "512K");
        assert_eq!(format_kib(2048), "2.0M");
        assert_eq!(format_kib(16_000_000), "15.3G");
    }
}
