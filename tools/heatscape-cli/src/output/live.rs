//! Live Output Formatting (for monitor, temperature and align)

use chrono::{DateTime, Local};
use colored::Colorize;
use heatscape_link::{AlignmentOutcome, AlignmentStatus, Direction, LogEntry, Telemetry};

fn local_time(at_ms: u64) -> DateTime<Local> {
    DateTime::from_timestamp_millis(at_ms as i64)
        .map(|t| t.with_timezone(&Local))
        .unwrap_or_else(Local::now)
}

/// Format one operator log line
pub fn format_log_entry(entry: &LogEntry) -> String {
    let time = local_time(entry.at_ms)
        .format("%H:%M:%S%.3f")
        .to_string()
        .dimmed();
    let line = entry.to_string();
    let line = match entry.direction {
        Direction::Inbound => line.cyan(),
        Direction::Outbound => line.green(),
        Direction::System => line.yellow(),
    };
    format!("{} {}", time, line)
}

pub fn print_log_entry(entry: &LogEntry) {
    println!("{}", format_log_entry(entry));
}

/// One-line telemetry summary
pub fn format_telemetry(t: &Telemetry) -> String {
    let mut parts = vec![
        format!(
            "gps {:.6},{:.6} sats:{} {:.1}km/h",
            t.gps.latitude, t.gps.longitude, t.gps.satellites, t.gps.speed
        ),
        format!(
            "att {:.1}/{:.1}/{:.1}",
            t.imu.angle_x, t.imu.angle_y, t.imu.angle_z
        ),
    ];
    if let Some(mean) = t.temperature.mean() {
        parts.push(format!("temp {:.1}°C", mean));
    }
    if let Some(url) = t.camera_url() {
        parts.push(format!("cam {}", url));
    }
    let nav = &t.navigation;
    if nav.auto_active {
        let distance = nav
            .last_data
            .map(|d| format!(" {:.1}m", d.distance))
            .unwrap_or_default();
        parts.push(format!("auto{}", distance));
    } else if nav.target_reached {
        parts.push("target reached".to_string());
    }
    format!("{} {}", "📊".dimmed(), parts.join(" | "))
}

pub fn print_telemetry(t: &Telemetry) {
    println!("{}", format_telemetry(t));
}

/// Temperature sample set with summary statistics
pub fn print_temperature(t: &Telemetry) {
    let reading = &t.temperature;
    let samples: Vec<String> = reading.samples.iter().map(|s| format!("{:.1}", s)).collect();
    println!("🌡️  {} sample(s): [{}]", reading.samples.len(), samples.join(", "));
    if let (Some(mean), Some(min), Some(max)) = (reading.mean(), reading.min(), reading.max()) {
        println!(
            "   mean {} | min {:.1} | max {:.1}",
            format!("{:.2}°C", mean).bold(),
            min,
            max
        );
    }
}

pub fn format_alignment(status: &AlignmentStatus) -> String {
    format!(
        "{:<10} pan {:>3}° tilt {:>3}° centered {} poll {}",
        format!("{:?}", status.state).to_lowercase(),
        status.pan,
        status.tilt,
        status.centered_streak,
        status.polls
    )
}

pub fn print_alignment(status: &AlignmentStatus) {
    println!("{} {}", "🎯".dimmed(), format_alignment(status));
}

pub fn print_alignment_outcome(outcome: AlignmentOutcome) {
    match outcome {
        AlignmentOutcome::Confirmed => println!("{}", "✅ Camera aligned".green()),
        AlignmentOutcome::GaveUp => {
            println!("{}", "⚠️  Reference not found; camera recentered".yellow())
        }
        AlignmentOutcome::Stopped => println!("{}", "⏹  Alignment stopped".dimmed()),
    }
}

/// Print monitor start message
pub fn print_monitor_start(url: &str) {
    println!("📡 Monitoring vehicle: {}", url.bold());
    println!("{}", "Press Ctrl+C to stop".dimmed());
    println!();
}

/// Print monitor stop message
pub fn print_monitor_stop() {
    println!();
    println!("{}", "✅ Stopped monitoring".green());
}
