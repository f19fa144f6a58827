use chrono::{DateTime, Local, NaiveDate};

const SUBJECT_PREFIX: &str = "INTEL REPORT";

/// Subject line carrying the run's calendar date
pub fn subject_for(date: NaiveDate) -> String {
    format!("{}: {}", SUBJECT_PREFIX, date.format("%d/%m/%Y"))
}

/// Wrap the AI-written cards in the outer email layout
pub fn render_report(body: &str, item_count: usize, generated_at: DateTime<Local>) -> String {
    let generated = generated_at.format("%d/%m/%Y %H:%M");
    let noun = if item_count == 1 { "item" } else { "items" };

    format!(
        r#"<html>
    <body style="background-color: #f4f4f4; padding: 20px;">
        <div style="max-width: 800px; margin: 0 auto; background-color: #ffffff; padding: 30px; border-radius: 10px; box-shadow: 0 4px 8px rgba(0,0,0,0.1);">
            <h1 style="text-align: center; color: #2c3e50;">Daily Intelligence Summary</h1>
            <p style="text-align: center; color: #7f8c8d;">Priority: Financial Sector and Data Threats</p>
            <p style="text-align: center; color: #95a5a6; font-size: 12px;">{item_count} {noun} analysed &middot; generated {generated}</p>
            <hr style="border: 0; border-top: 1px solid #eee; margin: 20px 0;">
            {body}
            <footer style="text-align: center; font-size: 12px; color: #bdc3c7; margin-top: 30px;">
                threatbrief {version} &middot; generated automatically
            </footer>
        </div>
    </body>
</html>
"#,
        version = env!("CARGO_PKG_VERSION"),
    )
}
