use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::sizing::error::Field;
use crate::sizing::{
    compute_kelly, ErrorKind, KellyErrors, KellyFormData, KellyInput, KellyResult, Locale,
    RiskAdjustment, TradeRecord,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Risk policy used when a request does not carry its own.
    pub defaults: RiskAdjustment,
    pub locale: Locale,
}

type ApiError = (StatusCode, String);

fn internal(e: anyhow::Error) -> ApiError {
    warn!("Trade journal error: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Build the Axum router for the calculator.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/config", get(config_handler))
        .route("/api/kelly", post(kelly_handler))
        .route("/api/kelly/journal", post(journal_kelly_handler))
        .route(
            "/api/trades",
            get(list_trades_handler)
                .post(add_trade_handler)
                .delete(clear_trades_handler),
        )
        .route("/api/trades/:id", delete(delete_trade_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

// ── Request / response shapes ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Manual,
    FromTrades,
}

/// `{ mode, input, adjustment? }`; `input` is parsed according to `mode`.
#[derive(Debug, Deserialize)]
pub struct KellyRequest {
    pub mode: Mode,
    pub input: serde_json::Value,
    #[serde(default)]
    pub adjustment: Option<AdjustmentPatch>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JournalKellyRequest {
    #[serde(default)]
    pub adjustment: Option<AdjustmentPatch>,
}

/// Per-request risk overrides; absent fields keep the server defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentPatch {
    pub fraction_multiplier: Option<f64>,
    pub max_position_fraction: Option<f64>,
}

impl AdjustmentPatch {
    pub fn apply(self, defaults: RiskAdjustment) -> RiskAdjustment {
        RiskAdjustment {
            fraction_multiplier: self
                .fraction_multiplier
                .unwrap_or(defaults.fraction_multiplier),
            max_position_fraction: self
                .max_position_fraction
                .unwrap_or(defaults.max_position_fraction),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewTrade {
    pub outcome: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorView {
    pub kind: ErrorKind,
    pub field: Option<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum KellyResponse {
    #[serde(rename_all = "camelCase")]
    Success {
        result: KellyResult,
        warning_messages: Vec<String>,
    },
    Failure {
        errors: Vec<ErrorView>,
    },
}

impl KellyResponse {
    fn from_outcome(outcome: Result<KellyResult, KellyErrors>, locale: Locale) -> Self {
        match outcome {
            Ok(result) => {
                let warning_messages = result
                    .warnings
                    .iter()
                    .map(|w| w.localized(locale))
                    .collect();
                KellyResponse::Success {
                    result,
                    warning_messages,
                }
            }
            Err(errors) => {
                debug!(
                    "Kelly request rejected with {} error(s): {:?}",
                    errors.len(),
                    errors.kinds()
                );
                KellyResponse::Failure {
                    errors: errors
                        .iter()
                        .map(|e| ErrorView {
                            kind: e.kind(),
                            field: e.field(),
                            trade_id: e.trade_id().map(str::to_owned),
                            message: e.localized(locale),
                        })
                        .collect(),
                }
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            KellyResponse::Success { .. } => StatusCode::OK,
            KellyResponse::Failure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub adjustment: RiskAdjustment,
    pub locale: Locale,
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// Serve the calculator page, injecting the configured locale.
async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let lang = match state.locale {
        Locale::En => "en",
        Locale::Zh => "zh",
    };
    Html(CALCULATOR_HTML.replace(r#"<html lang="en">"#, &format!(r#"<html lang="{}">"#, lang)))
}

/// GET /api/config
async fn config_handler(State(state): State<Arc<AppState>>) -> Json<ConfigView> {
    Json(ConfigView {
        adjustment: state.defaults,
        locale: state.locale,
    })
}

/// POST /api/kelly
async fn kelly_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<KellyRequest>,
) -> Result<(StatusCode, Json<KellyResponse>), ApiError> {
    let adjustment = req.adjustment.unwrap_or_default().apply(state.defaults);
    let outcome = match req.mode {
        Mode::Manual => {
            let form: KellyFormData = serde_json::from_value(req.input)
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid manual input: {}", e)))?;
            compute_kelly(KellyInput::Manual(form), &adjustment)
        }
        Mode::FromTrades => {
            let trades: Vec<TradeRecord> = serde_json::from_value(req.input)
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid trade list: {}", e)))?;
            compute_kelly(KellyInput::FromTrades(&trades), &adjustment)
        }
    };
    let response = KellyResponse::from_outcome(outcome, state.locale);
    Ok((response.status(), Json(response)))
}

/// POST /api/kelly/journal: size from the stored trade log
async fn journal_kelly_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JournalKellyRequest>,
) -> Result<(StatusCode, Json<KellyResponse>), ApiError> {
    let adjustment = req.adjustment.unwrap_or_default().apply(state.defaults);
    let trades = state.db.list_trades().map_err(internal)?;
    let outcome = compute_kelly(KellyInput::FromTrades(&trades), &adjustment);
    let response = KellyResponse::from_outcome(outcome, state.locale);
    Ok((response.status(), Json(response)))
}

/// GET /api/trades
async fn list_trades_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TradeRecord>>, ApiError> {
    state.db.list_trades().map(Json).map_err(internal)
}

/// POST /api/trades
async fn add_trade_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewTrade>,
) -> Result<(StatusCode, Json<TradeRecord>), ApiError> {
    if !req.outcome.is_finite() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "trade outcome must be a finite number".to_string(),
        ));
    }
    let trade = TradeRecord::new(req.outcome);
    state.db.insert_trade(&trade).map_err(internal)?;
    info!("Logged trade {} with outcome {:.2}", trade.id, trade.outcome);
    Ok((StatusCode::CREATED, Json(trade)))
}

/// DELETE /api/trades/:id
async fn delete_trade_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_trade(&id).map_err(internal)? {
        info!("Deleted trade {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("no trade with id {}", id)))
    }
}

/// DELETE /api/trades
async fn clear_trades_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.db.clear_trades().map_err(internal)?;
    info!("Cleared {} trades from the journal", removed);
    Ok(Json(serde_json::json!({ "removed": removed })))
}

/// Embedded single-file calculator (HTML + CSS + JS).  The page owns all
/// UI state: active tab, form values, trade list, risk settings and the
/// last result or error list.
const CALCULATOR_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Kelly Position Sizer</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #6c63ff;
    --green: #00c896;
    --red: #ff4f6a;
    --amber: #ff9800;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  header { display: flex; align-items: center; gap: 1rem; padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
  header h1 { font-size: 1.4rem; font-weight: 700; }
  main { padding: 1.5rem 2rem; display: grid; gap: 1.5rem; max-width: 960px; }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; overflow: hidden; }
  .panel-header { padding: .9rem 1.2rem; border-bottom: 1px solid var(--border); font-weight: 600; display: flex; gap: .5rem; align-items: center; }
  .panel-body { padding: 1.2rem; display: grid; gap: .8rem; }
  .tab { background: none; border: 1px solid var(--border); color: var(--muted); padding: .3rem .9rem; border-radius: 6px; cursor: pointer; }
  .tab.active { border-color: var(--accent); color: var(--accent); }
  label { display: grid; gap: .3rem; font-size: .8rem; color: var(--muted); text-transform: uppercase; letter-spacing: .05em; }
  input { background: var(--bg); border: 1px solid var(--border); color: var(--text); padding: .5rem .7rem; border-radius: 6px; font-size: 1rem; }
  .row { display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 1rem; }
  button.primary { background: var(--accent); border: none; color: #fff; padding: .55rem 1.2rem; border-radius: 6px; cursor: pointer; font-weight: 600; justify-self: start; }
  table { width: 100%; border-collapse: collapse; }
  th { padding: .6rem 1rem; text-align: left; font-size: .75rem; text-transform: uppercase; color: var(--muted); border-bottom: 1px solid var(--border); }
  td { padding: .55rem 1rem; font-size: .88rem; border-bottom: 1px solid #1e2130; }
  .pos { color: var(--green); }
  .neg { color: var(--red); }
  .value { font-size: 2rem; font-weight: 700; }
  .warn { color: var(--amber); font-size: .9rem; }
  .err { color: var(--red); font-size: .9rem; }
  .empty { color: var(--muted); text-align: center; padding: 1.2rem; font-size: .9rem; }
  .hidden { display: none; }
  .del { background: none; border: none; color: var(--muted); cursor: pointer; }
  .del:hover { color: var(--red); }
</style>
</head>
<body>
<header>
  <h1>Kelly Position Sizer</h1>
  <button class="tab active" id="tab-manual" onclick="setTab('manual')">Manual</button>
  <button class="tab" id="tab-fromTrades" onclick="setTab('fromTrades')">From trades</button>
</header>

<main>
  <div class="panel" id="manual-panel">
    <div class="panel-header">Trading statistics</div>
    <div class="panel-body">
      <div class="row">
        <label>Win rate (%)<input id="win-rate" type="number" step="any" value="60"></label>
        <label>Average win<input id="avg-win" type="number" step="any" value="150"></label>
        <label>Average loss<input id="avg-loss" type="number" step="any" value="100"></label>
      </div>
    </div>
  </div>

  <div class="panel hidden" id="trades-panel">
    <div class="panel-header">Trade log</div>
    <div class="panel-body">
      <div class="row">
        <label>Outcome (P&amp;L)<input id="outcome" type="number" step="any"></label>
      </div>
      <button class="primary" onclick="addTrade()">Log trade</button>
    </div>
    <table>
      <thead><tr><th>Time</th><th>Outcome</th><th></th></tr></thead>
      <tbody id="trades-tbody"><tr><td colspan="3" class="empty">No trades logged</td></tr></tbody>
    </table>
  </div>

  <div class="panel">
    <div class="panel-header">Risk adjustment</div>
    <div class="panel-body">
      <div class="row">
        <label>Kelly multiplier<input id="multiplier" type="number" step="any" value="1"></label>
        <label>Max position fraction<input id="cap" type="number" step="any" value="1"></label>
      </div>
      <button class="primary" onclick="calculate()">Calculate</button>
    </div>
  </div>

  <div class="panel">
    <div class="panel-header">Recommendation</div>
    <div class="panel-body" id="result"><div class="empty">Enter inputs and calculate</div></div>
  </div>
</main>

<script>
const state = { tab: 'manual', trades: [], result: null, errors: [] };
const num = id => parseFloat(document.getElementById(id).value);

function setTab(tab) {
  state.tab = tab;
  for (const t of ['manual', 'fromTrades']) {
    document.getElementById('tab-' + t).classList.toggle('active', t === tab);
  }
  document.getElementById('manual-panel').classList.toggle('hidden', tab !== 'manual');
  document.getElementById('trades-panel').classList.toggle('hidden', tab !== 'fromTrades');
}

function adjustment() {
  return { fractionMultiplier: num('multiplier'), maxPositionFraction: num('cap') };
}

async function loadConfig() {
  const r = await fetch('/api/config');
  if (!r.ok) return;
  const c = await r.json();
  document.getElementById('multiplier').value = c.adjustment.fractionMultiplier;
  document.getElementById('cap').value = c.adjustment.maxPositionFraction;
}

async function loadTrades() {
  const r = await fetch('/api/trades');
  if (!r.ok) return;
  state.trades = await r.json();
  const tbody = document.getElementById('trades-tbody');
  if (!state.trades.length) { tbody.innerHTML = '<tr><td colspan="3" class="empty">No trades logged</td></tr>'; return; }
  tbody.innerHTML = state.trades.map(t => `<tr>
    <td>${new Date(t.timestamp).toLocaleString()}</td>
    <td class="${t.outcome > 0 ? 'pos' : t.outcome < 0 ? 'neg' : ''}">${t.outcome.toFixed(2)}</td>
    <td><button class="del" onclick="deleteTrade('${t.id}')">✕</button></td>
  </tr>`).join('');
}

async function addTrade() {
  const outcome = num('outcome');
  if (!Number.isFinite(outcome)) return;
  await fetch('/api/trades', { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify({ outcome }) });
  document.getElementById('outcome').value = '';
  await loadTrades();
}

async function deleteTrade(id) {
  await fetch('/api/trades/' + encodeURIComponent(id), { method: 'DELETE' });
  await loadTrades();
}

async function calculate() {
  const r = state.tab === 'manual'
    ? await fetch('/api/kelly', { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify({
        mode: 'manual',
        input: { winRate: num('win-rate'), avgWin: num('avg-win'), avgLoss: num('avg-loss') },
        adjustment: adjustment(),
      }) })
    : await fetch('/api/kelly/journal', { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify({ adjustment: adjustment() }) });
  const body = r.headers.get('content-type')?.includes('json') ? await r.json() : { errors: [{ message: await r.text() }] };
  state.result = body.result || null;
  state.errors = body.errors || [];
  render(body.warningMessages || []);
}

function render(warnings) {
  const el = document.getElementById('result');
  if (state.errors.length) {
    el.innerHTML = state.errors.map(e => `<div class="err">${e.message}</div>`).join('');
    return;
  }
  const res = state.result;
  el.innerHTML = `
    <div class="value ${res.adjustedFraction > 0 ? 'pos' : ''}">${res.recommendedPositionPercentage.toFixed(2)}%</div>
    <div>Raw Kelly: ${(res.rawKellyFraction * 100).toFixed(2)}% · Payoff ratio: ${res.payoffRatio.toFixed(3)} · Expectancy: ${res.expectancy.toFixed(2)}</div>
    ${res.tradeStats ? `<div>${res.tradeStats.totalTrades} trades · win rate ${res.tradeStats.winRate.toFixed(1)}%</div>` : ''}
    ${warnings.map(w => `<div class="warn">${w}</div>`).join('')}`;
}

loadConfig();
loadTrades();
</script>
</body>
</html>
"#;
