use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Mutex;

use study_tracker::analytics::{AnalyticsError, SeriesAnalyzer};
use study_tracker::data::{self, SubjectEntry};

/// Rows live behind a mutex in app data; every request rebuilds the series
/// from them so the analyzer itself stays stateless.
struct AppState {
    log_path: String,
    rows: Mutex<Vec<SubjectEntry>>,
}

#[derive(Deserialize)]
struct VolatilityQuery {
    window: Option<usize>,
}

#[derive(Deserialize)]
struct TopSubjectsQuery {
    days: Option<i64>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct LogRequest {
    subject: String,
    date: NaiveDate,
    hours: f64,
}

#[derive(Serialize)]
struct LogResponse {
    total_rows: usize,
}

#[derive(Serialize)]
struct TopSubject {
    subject: String,
    hours: f64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn analytics_error(err: AnalyticsError) -> HttpResponse {
    // Both analytics errors are recoverable "show a no-data state" cases
    // for the page, not server faults.
    HttpResponse::UnprocessableEntity().json(ErrorResponse {
        error: err.to_string(),
    })
}

async fn get_summary(state: web::Data<AppState>) -> HttpResponse {
    let rows = state.rows.lock().unwrap();
    let series = data::aggregate_daily(&rows);
    let analyzer = SeriesAnalyzer::new();
    match analyzer.streak_summary(&series, Local::now().date_naive()) {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(err) => analytics_error(err),
    }
}

async fn get_daily(state: web::Data<AppState>) -> HttpResponse {
    let rows = state.rows.lock().unwrap();
    let series = data::aggregate_daily(&rows);
    let analyzer = SeriesAnalyzer::new();
    match analyzer.daily_totals(&series) {
        Ok(totals) => HttpResponse::Ok().json(totals.records),
        Err(err) => analytics_error(err),
    }
}

async fn get_volatility(
    state: web::Data<AppState>,
    query: web::Query<VolatilityQuery>,
) -> HttpResponse {
    let window = query.window.unwrap_or(7);
    let rows = state.rows.lock().unwrap();
    let series = data::aggregate_daily(&rows);
    let analyzer = SeriesAnalyzer::new();
    match analyzer.rolling_volatility(&series, window) {
        Ok(points) => HttpResponse::Ok().json(points),
        Err(err) => analytics_error(err),
    }
}

async fn get_weekly(state: web::Data<AppState>) -> HttpResponse {
    let rows = state.rows.lock().unwrap();
    let series = data::aggregate_daily(&rows);
    let analyzer = SeriesAnalyzer::new();
    HttpResponse::Ok().json(analyzer.weekly_average(&series))
}

async fn get_weekdays(state: web::Data<AppState>) -> HttpResponse {
    let rows = state.rows.lock().unwrap();
    let series = data::aggregate_daily(&rows);
    let analyzer = SeriesAnalyzer::new();
    HttpResponse::Ok().json(analyzer.weekday_profile(&series))
}

async fn get_top_subjects(
    state: web::Data<AppState>,
    query: web::Query<TopSubjectsQuery>,
) -> HttpResponse {
    let days = query.days.unwrap_or(15);
    let limit = query.limit.unwrap_or(3);
    let since = Local::now().date_naive() - Duration::days(days);

    let rows = state.rows.lock().unwrap();
    let top: Vec<TopSubject> = data::top_subjects(&rows, since, limit)
        .into_iter()
        .map(|(subject, hours)| TopSubject { subject, hours })
        .collect();
    HttpResponse::Ok().json(top)
}

async fn post_log(state: web::Data<AppState>, req: web::Json<LogRequest>) -> HttpResponse {
    if req.hours < 0.0 || !req.hours.is_finite() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "hours must be a non-negative number".to_string(),
        });
    }
    if req.subject.trim().is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "subject must not be empty".to_string(),
        });
    }

    let mut rows = state.rows.lock().unwrap();
    rows.push(SubjectEntry {
        subject: req.subject.trim().to_string(),
        date: req.date,
        hours: req.hours,
    });

    // Full-replacement snapshot, so the file always matches the rows we
    // are serving from.
    if let Err(err) = data::write_snapshot(&state.log_path, &rows) {
        rows.pop();
        log::error!("failed to persist study log: {}", err);
        return HttpResponse::InternalServerError().json(ErrorResponse {
            error: err.to_string(),
        });
    }

    HttpResponse::Ok().json(LogResponse {
        total_rows: rows.len(),
    })
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("Study Tracker API is running!")
}

async fn serve_homepage() -> HttpResponse {
    let html_content = r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>Study Tracker Dashboard</title>
        <style>
            body { font-family: Arial, sans-serif; max-width: 900px; margin: 40px auto; padding: 20px; }
            .container { background: #f5f5f5; padding: 25px; border-radius: 10px; }
            .cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 15px; margin: 20px 0; }
            .card { background: white; padding: 18px; border-radius: 8px; border-left: 4px solid #008080; text-align: center; }
            .card h2 { margin: 0; color: #008080; font-size: 28px; }
            .card p { margin: 6px 0 0; color: #4a4a4a; }
            .section { background: white; padding: 18px; border-radius: 8px; margin: 15px 0; }
            table { width: 100%; border-collapse: collapse; }
            th, td { padding: 8px; text-align: left; border-bottom: 1px solid #ddd; }
            .form-group { margin: 10px 0; }
            label { display: block; margin-bottom: 4px; font-weight: bold; }
            input { width: 100%; padding: 8px; border: 1px solid #ddd; border-radius: 4px; box-sizing: border-box; }
            button { background: #008080; color: white; padding: 10px 20px; border: none; border-radius: 4px; cursor: pointer; margin-top: 10px; }
            button:hover { background: #006666; }
            .warning { background: #fff3cd; color: #856404; padding: 12px; border-radius: 5px; margin: 10px 0; }
        </style>
    </head>
    <body>
        <div class="container">
            <h1>📚 Study Tracker Dashboard</h1>
            <div id="no-data" class="warning" style="display: none;">No study data yet - log your first session below.</div>

            <div class="cards" id="summary-cards"></div>

            <div class="section">
                <h3>🌟 Top Subjects (last 15 days)</h3>
                <div id="top-subjects"></div>
            </div>

            <div class="section">
                <h3>📅 Weekly Averages</h3>
                <table><thead><tr><th>Week of</th><th>Avg hours/day</th></tr></thead>
                <tbody id="weekly-body"></tbody></table>
            </div>

            <div class="section">
                <h3>📊 Weekday Profile</h3>
                <table><thead><tr><th>Weekday</th><th>Avg hours</th></tr></thead>
                <tbody id="weekday-body"></tbody></table>
            </div>

            <div class="section">
                <h3>✏️ Log a Study Session</h3>
                <div class="form-group">
                    <label for="subject">Subject:</label>
                    <input type="text" id="subject" placeholder="e.g., Mathematics">
                </div>
                <div class="form-group">
                    <label for="date">Date:</label>
                    <input type="date" id="date">
                </div>
                <div class="form-group">
                    <label for="hours">Hours:</label>
                    <input type="number" id="hours" step="0.25" min="0" placeholder="e.g., 2.5">
                </div>
                <button onclick="logSession()">Save Session</button>
                <div id="log-result"></div>
            </div>
        </div>

        <script>
            async function loadSummary() {
                const cards = document.getElementById('summary-cards');
                const response = await fetch('/api/summary');
                if (!response.ok) {
                    document.getElementById('no-data').style.display = 'block';
                    cards.innerHTML = '';
                    return;
                }
                document.getElementById('no-data').style.display = 'none';
                const data = await response.json();
                cards.innerHTML = `
                    <div class="card"><h2>${data.longest_streak}</h2><p>Longest streak (days)</p></div>
                    <div class="card"><h2>${data.current_streak}</h2><p>Current streak (days)</p></div>
                    <div class="card"><h2>${data.distinct_study_days}</h2><p>Days studied</p></div>
                    <div class="card"><h2>${data.record.hours.toFixed(2)}h</h2><p>Record day (${data.record.date})</p></div>
                `;
            }

            async function loadTopSubjects() {
                const response = await fetch('/api/subjects/top?days=15&limit=3');
                const data = await response.json();
                document.getElementById('top-subjects').innerHTML = data.length
                    ? data.map(s => `<div class="card" style="display:inline-block; margin:5px; min-width:150px;">
                          <h2>${s.subject}</h2><p>${s.hours.toFixed(2)} Hours</p></div>`).join('')
                    : '<p>No subjects studied in the last 15 days.</p>';
            }

            async function loadWeekly() {
                const response = await fetch('/api/weekly');
                const data = await response.json();
                document.getElementById('weekly-body').innerHTML = data
                    .map(w => `<tr><td>${w.week_start}</td><td>${w.avg_hours.toFixed(2)}</td></tr>`).join('');
            }

            async function loadWeekdays() {
                const response = await fetch('/api/weekdays');
                const data = await response.json();
                document.getElementById('weekday-body').innerHTML = data
                    .map(w => `<tr><td>${w.weekday}</td><td>${w.avg_hours.toFixed(2)}</td></tr>`).join('');
            }

            async function logSession() {
                const resultDiv = document.getElementById('log-result');
                try {
                    const response = await fetch('/api/log', {
                        method: 'POST',
                        headers: {'Content-Type': 'application/json'},
                        body: JSON.stringify({
                            subject: document.getElementById('subject').value,
                            date: document.getElementById('date').value,
                            hours: parseFloat(document.getElementById('hours').value)
                        })
                    });
                    const data = await response.json();
                    if (!response.ok) throw new Error(data.error);
                    resultDiv.innerHTML = `<p style="color: green;">Saved! ${data.total_rows} rows in the log.</p>`;
                    refresh();
                } catch (error) {
                    resultDiv.innerHTML = `<p style="color: red;">Error: ${error.message}</p>`;
                }
            }

            function refresh() {
                loadSummary();
                loadTopSubjects();
                loadWeekly();
                loadWeekdays();
            }

            refresh();
        </script>
    </body>
    </html>
    "#;

    HttpResponse::Ok().content_type("text/html").body(html_content)
}

async fn start_api(state: AppState) -> std::io::Result<()> {
    let state_data = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .wrap(middleware::Logger::default())
            .route("/", web::get().to(serve_homepage))
            .route("/api/summary", web::get().to(get_summary))
            .route("/api/daily", web::get().to(get_daily))
            .route("/api/volatility", web::get().to(get_volatility))
            .route("/api/weekly", web::get().to(get_weekly))
            .route("/api/weekdays", web::get().to(get_weekdays))
            .route("/api/subjects/top", web::get().to(get_top_subjects))
            .route("/api/log", web::post().to(post_log))
            .route("/health", web::get().to(health_check))
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let log_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/study_log.csv".to_string());

    log::info!("Loading study log from {}", log_path);
    let rows = data::load_rows(&log_path)?;
    log::info!("Loaded {} subject rows", rows.len());

    let series = data::aggregate_daily(&rows);
    if series.is_empty() {
        log::warn!("Study log is empty - the dashboard will show a no-data state");
    } else {
        log::info!(
            "{} distinct days, {:.1} total hours",
            series.len(),
            series.total_hours()
        );
    }

    log::info!("Starting Study Tracker dashboard on http://127.0.0.1:8080");
    start_api(AppState {
        log_path,
        rows: Mutex::new(rows),
    })
    .await?;

    Ok(())
}
