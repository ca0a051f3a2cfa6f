//! The `gradecurve attendance` command.

use anyhow::Result;

use gradecurve_core::attendance;
use gradecurve_core::policy::CoursePolicy;
use gradecurve_core::scoring::score_attendance_detailed;

pub fn execute(ledger_text: String, total_sessions: i32, max_score: f64, late_penalty: f64) -> Result<()> {
    let policy = CoursePolicy {
        total_sessions,
        attendance_max_score: max_score,
        late_penalty_per_session: late_penalty,
        ..Default::default()
    };
    policy.validate_attendance()?;

    let ledger = attendance::decode(&ledger_text);
    let scored = score_attendance_detailed(&ledger, &policy)?;
    let total = total_sessions as u32;

    println!("Sessions recorded: {}", ledger.len());
    println!("Normalized: {}", attendance::encode(&ledger));
    println!("Rate: {}", attendance::rate(&ledger, total));
    println!(
        "Present: {}  Late: {}  Absent: {}",
        scored.tally.present, scored.tally.late, scored.tally.absent
    );
    if scored.late_penalty > 0.0 {
        println!("Late penalty: {:.2}", scored.late_penalty);
    }
    println!(
        "Score: {:.2} / {} ({:.2}%)",
        scored.component.current_score, scored.component.max_score, scored.component.percentage
    );

    if let Some(last) = ledger.last_session().filter(|&s| s > total) {
        eprintln!("WARNING: session {last} is past the last session ({total}) and was not scored");
    }

    Ok(())
}
