//! The embedded dashboard page.
//!
//! One HTML template serves both delivery modes. `report` inlines the
//! payload where the placeholder sits, producing a self-contained file;
//! `serve` ships the page with `null` instead, and the page re-fetches
//! `/api/dashboard` with the sidebar parameters on every change — each
//! fetch is a full pipeline run on the server.

use eyre::{Result, WrapErr};

use crate::view::DashboardData;

const DATA_PLACEHOLDER: &str = "__DASHBOARD_DATA__";

/// Self-contained report page with the payload inlined.
///
/// # Errors
/// Returns error if the payload fails to serialize.
pub fn render_report(data: &DashboardData) -> Result<String> {
    let json = serde_json::to_string(data).wrap_err("failed to serialize dashboard payload")?;
    Ok(DASHBOARD_HTML.replacen(DATA_PLACEHOLDER, &json, 1))
}

/// Page for serve mode: no inline payload, data comes from the API.
pub fn render_live() -> String {
    DASHBOARD_HTML.replacen(DATA_PLACEHOLDER, "null", 1)
}

pub const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Football Transfer Network</title>
<script src="https://unpkg.com/vis-network/standalone/umd/vis-network.min.js"></script>
<style>
*{box-sizing:border-box;margin:0;padding:0}
:root{
  --bg:#1a1a22;--panel:#222230;--panel2:#2a2a3a;--border:#34344a;
  --text:#d0d0dc;--dim:#7a7a94;--accent:#1f78b4;--hl:#0077b6;
}
body{background:var(--bg);color:var(--text);font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;font-size:14px;display:flex;min-height:100vh}

/* SIDEBAR */
#sb{width:260px;min-width:260px;background:var(--panel);border-right:1px solid var(--border);padding:18px 16px;display:flex;flex-direction:column;gap:6px}
#sb h1{font-size:16px;margin-bottom:4px}
#sb .sub{font-size:11px;color:var(--dim);margin-bottom:12px}
#sb h2{font-size:11px;color:var(--dim);text-transform:uppercase;letter-spacing:.07em;margin:12px 0 4px}
#sb select,#sb input[type=number]{width:100%;background:var(--panel2);border:1px solid var(--border);color:var(--text);padding:6px 8px;border-radius:4px;font-size:13px}
#sb select:focus,#sb input:focus{outline:none;border-color:var(--accent)}
.chk{display:flex;align-items:center;gap:8px;padding:4px 0;font-size:13px;cursor:pointer}
.chk input{accent-color:var(--accent);width:14px;height:14px}
#apply{margin-top:14px;background:var(--accent);color:#fff;border:none;padding:8px;border-radius:4px;cursor:pointer;font-size:13px;font-weight:500}
#apply:hover{opacity:.9}
#apply:disabled{opacity:.4;cursor:default}
#frozen{display:none;font-size:11px;color:var(--dim);margin-top:10px;line-height:1.5}
#generated{margin-top:auto;font-size:10px;color:var(--dim)}

/* MAIN */
#main{flex:1;padding:20px 24px;overflow-y:auto}
#main h2{font-size:15px;margin:22px 0 10px}
#main h2:first-child{margin-top:0}
.caption{font-size:11px;color:var(--dim);margin-top:6px;line-height:1.5}

#err{display:none;background:#3a1f26;border:1px solid #7a3040;color:#e8aab8;padding:10px 14px;border-radius:6px;margin-bottom:14px;font-size:13px}

#net{height:600px;background:#222222;border:1px solid var(--border);border-radius:6px}

/* SUMMARY CARDS */
#cards{display:grid;grid-template-columns:repeat(auto-fill,minmax(180px,1fr));gap:10px}
.card{background:var(--panel);border:1px solid var(--border);border-radius:6px;padding:10px 12px}
.card .l{font-size:10px;color:var(--dim);text-transform:uppercase;letter-spacing:.06em}
.card .v{font-size:20px;font-weight:700;margin-top:2px}
.card .v.na{font-size:12px;font-weight:400;color:var(--dim)}
.card .c{font-size:10px;color:var(--dim);margin-top:4px;line-height:1.4}

#hist{background:var(--panel);border:1px solid var(--border);border-radius:6px;width:100%;height:260px}

/* TABS + TABLES */
#tabs{display:flex;gap:6px;flex-wrap:wrap;margin-bottom:8px}
.tab{background:var(--panel2);border:1px solid var(--border);color:var(--dim);padding:5px 12px;border-radius:4px;cursor:pointer;font-size:12px}
.tab.active,.tab:hover{border-color:var(--accent);color:var(--accent)}
table{border-collapse:collapse;font-size:12px;width:100%}
th{background:var(--panel);padding:6px 10px;text-align:left;border-bottom:1px solid var(--border);color:var(--dim);font-weight:500}
td{padding:5px 10px;border-bottom:1px solid var(--panel2)}
tr:hover td{background:var(--panel2)}

/* ADJACENCY */
#adjwrap{overflow-x:auto;border:1px solid var(--border);border-radius:6px}
#adj th{position:sticky;top:0}
#adj td{text-align:center;min-width:34px}
#adj td.nz{background:var(--hl);color:#fff;font-weight:600}
#adj th.rowlbl,#adj td.rowlbl{text-align:left;white-space:nowrap}
</style>
</head>
<body>

<div id="sb">
  <h1>Football Transfer Network</h1>
  <div class="sub">Clubs linked by player transfer flows</div>

  <h2>Node size by</h2>
  <select id="sizeMetric">
    <option value="degree">Total degree</option>
    <option value="in_degree">In-degree</option>
    <option value="out_degree">Out-degree</option>
    <option value="betweenness">Betweenness</option>
    <option value="closeness">Closeness</option>
    <option value="eigenvector">Eigenvector</option>
  </select>

  <h2>Edges</h2>
  <label class="chk"><input type="checkbox" id="edgeWidth" checked> Width by transfer value</label>

  <h2>Physics</h2>
  <label class="chk"><input type="checkbox" id="physics" checked> Enable network physics</label>

  <h2>Filters</h2>
  <label class="chk"><input type="checkbox" id="connectedOnly" checked> Connected subgraph only</label>
  <h2>Minimum fee (millions)</h2>
  <input type="number" id="minFee" min="0" step="0.5" value="1">

  <button id="apply">Apply</button>
  <div id="frozen">Static report — parameters were fixed when this file was generated. Re-run the report command or use serve mode to change them.</div>
  <div id="generated"></div>
</div>

<div id="main">
  <div id="err"></div>

  <h2>Interactive Transfer Network</h2>
  <div id="net"></div>
  <div class="caption">Hover a club or a flow for details. Edge direction runs from the selling club to the buying club.</div>

  <h2>Network Metrics</h2>
  <div id="cards"></div>

  <h2>Degree Distribution</h2>
  <canvas id="hist"></canvas>
  <div class="caption">How many clubs have each number of connections.</div>

  <h2>Top 10 Clubs by Centrality</h2>
  <div id="tabs"></div>
  <div id="ranking"></div>
  <div class="caption" id="rankCaption"></div>

  <h2>Adjacency Matrix</h2>
  <div id="adjwrap"></div>
  <div class="caption">Transfers between the 20 clubs with the most connections; highlighted cells are non-zero. Rows sell, columns buy.</div>
</div>

<script>
const EMBEDDED = __DASHBOARD_DATA__;

const SUMMARY_CARDS = [
  {key:'clubs', label:'Clubs', caption:''},
  {key:'flows', label:'Transfer flows', caption:'Aggregated directed club pairs.'},
  {key:'density', label:'Density', fmt:v=>v.toFixed(4), caption:'Existing flows over possible ones (0-1).'},
  {key:'strongly_connected', label:'Strongly connected components', caption:'Groups where every club reaches every other along flow direction.'},
  {key:'weakly_connected', label:'Weakly connected components', caption:'Groups connected when direction is ignored.'},
  {key:'diameter', label:'Diameter', cell:true, caption:'Longest shortest path between any two clubs.'},
  {key:'assortativity', label:'Assortativity', cell:true, caption:'Whether busy clubs trade with other busy clubs (positive) or quiet ones (negative).'},
  {key:'periphery', label:'Periphery', cell:true, caption:'Clubs farthest from the rest of the network.'},
  {key:'transfers', label:'Transfers', caption:'Individual moves above the fee filter.'},
  {key:'total_fee_millions', label:'Total value (€M)', fmt:v=>v.toLocaleString(undefined,{maximumFractionDigits:2}), caption:''},
  {key:'avg_fee_millions', label:'Average value (€M)', fmt:v=>v.toLocaleString(undefined,{maximumFractionDigits:2}), caption:''},
];

const RANK_CAPTIONS = {
  degree: 'Clubs with the most total connections.',
  in_degree: 'Clubs buying from the widest range of sellers.',
  out_degree: 'Clubs selling to the widest range of buyers.',
  betweenness: 'Clubs bridging otherwise separate parts of the market.',
  closeness: 'Clubs the rest of the market reaches in few steps.',
  eigenvector: 'Clubs connected to other well-connected clubs.',
};

let network = null;
let activeTab = 'degree';

function params() {
  return {
    size_metric: document.getElementById('sizeMetric').value,
    edge_width: document.getElementById('edgeWidth').checked,
    physics: document.getElementById('physics').checked,
    connected_only: document.getElementById('connectedOnly').checked,
    min_fee: document.getElementById('minFee').value,
  };
}

function setControls(p) {
  document.getElementById('sizeMetric').value = p.size_metric;
  document.getElementById('edgeWidth').checked = p.edge_width_by_value;
  document.getElementById('physics').checked = p.physics;
  document.getElementById('connectedOnly').checked = p.connected_only;
  document.getElementById('minFee').value = p.min_fee_millions;
}

function showError(msg) {
  const el = document.getElementById('err');
  el.textContent = msg;
  el.style.display = 'block';
}

function hideError() {
  document.getElementById('err').style.display = 'none';
}

async function refresh() {
  if (EMBEDDED) { render(EMBEDDED); return; }
  const p = params();
  const qs = new URLSearchParams(p).toString();
  try {
    const resp = await fetch('/api/dashboard?' + qs);
    const body = await resp.json();
    if (!resp.ok) { showError(body.error || 'pipeline failed'); return; }
    hideError();
    render(body);
  } catch (err) {
    showError(err.message);
  }
}

function render(data) {
  drawNetwork(data);
  renderCards(data.summary);
  drawHistogram(data.degree_histogram);
  renderTabs(data.rankings);
  renderRanking(data.rankings);
  renderAdjacency(data.adjacency);
  document.getElementById('generated').textContent = 'Generated ' + data.generated_at;
}

function drawNetwork(data) {
  const nodes = new vis.DataSet(data.nodes.map(n => ({
    id: n.id, label: n.label, size: n.size, color: n.color, title: n.title, shape: 'dot',
  })));
  const edges = new vis.DataSet(data.edges.map(e => ({
    from: e.from, to: e.to, width: e.width, title: e.title, color: e.color,
    arrows: 'to',
  })));
  if (network) network.destroy();
  network = new vis.Network(document.getElementById('net'), {nodes, edges}, data.options);
}

function renderCards(summary) {
  const cards = document.getElementById('cards');
  cards.innerHTML = SUMMARY_CARDS.map(def => {
    let value, na = false;
    if (def.cell) {
      const cell = summary[def.key];
      if (cell.value !== null) { value = cell.value; }
      else { value = 'not computable (' + cell.reason + ')'; na = true; }
    } else {
      const raw = summary[def.key];
      value = def.fmt ? def.fmt(raw) : raw;
    }
    return '<div class="card"><div class="l">' + def.label + '</div>' +
      '<div class="v' + (na ? ' na' : '') + '">' + value + '</div>' +
      (def.caption ? '<div class="c">' + def.caption + '</div>' : '') + '</div>';
  }).join('');
}

function drawHistogram(bins) {
  const canvas = document.getElementById('hist');
  canvas.width = canvas.clientWidth;
  canvas.height = canvas.clientHeight;
  const cx = canvas.getContext('2d');
  cx.clearRect(0, 0, canvas.width, canvas.height);
  if (!bins.length) return;

  const padL = 36, padB = 26, padT = 12, padR = 12;
  const W = canvas.width - padL - padR, H = canvas.height - padT - padB;
  const maxCount = Math.max(...bins.map(b => b.count), 1);
  const barW = W / bins.length;

  cx.font = '10px sans-serif';
  cx.textAlign = 'center';
  bins.forEach((bin, i) => {
    const h = bin.count / maxCount * H;
    const x = padL + i * barW;
    cx.fillStyle = '#1f78b4';
    cx.fillRect(x + barW * 0.1, padT + H - h, barW * 0.8, h);
    cx.fillStyle = '#7a7a94';
    if (bins.length <= 30 || i % Math.ceil(bins.length / 30) === 0) {
      cx.fillText(bin.degree, x + barW / 2, padT + H + 14);
    }
  });
  cx.textAlign = 'right';
  cx.fillStyle = '#7a7a94';
  cx.fillText(maxCount, padL - 6, padT + 8);
  cx.fillText('0', padL - 6, padT + H);
}

function renderTabs(rankings) {
  const tabs = document.getElementById('tabs');
  tabs.innerHTML = rankings.map(t =>
    '<button class="tab' + (t.metric === activeTab ? ' active' : '') + '" data-m="' + t.metric + '">' + t.label + '</button>'
  ).join('');
  tabs.querySelectorAll('.tab').forEach(btn => {
    btn.addEventListener('click', () => {
      activeTab = btn.dataset.m;
      renderTabs(rankings);
      renderRanking(rankings);
    });
  });
}

function renderRanking(rankings) {
  const table = rankings.find(t => t.metric === activeTab) || rankings[0];
  if (!table) return;
  const html = '<table><thead><tr>' +
    '<th>Club</th><th>Total degree</th><th>In-degree</th><th>Out-degree</th>' +
    '<th>Betweenness</th><th>Closeness</th><th>Eigenvector</th></tr></thead><tbody>' +
    table.rows.map(r => '<tr><td>' + r.club + '</td><td>' + r.degree + '</td><td>' + r.in_degree +
      '</td><td>' + r.out_degree + '</td><td>' + r.betweenness.toFixed(3) + '</td><td>' +
      r.closeness.toFixed(3) + '</td><td>' + r.eigenvector.toFixed(3) + '</td></tr>').join('') +
    '</tbody></table>';
  document.getElementById('ranking').innerHTML = html;
  document.getElementById('rankCaption').textContent = RANK_CAPTIONS[table.metric] || '';
}

function renderAdjacency(adj) {
  const head = '<tr><th class="rowlbl"></th>' +
    adj.labels.map(l => '<th title="' + l + '">' + l + '</th>').join('') + '</tr>';
  const body = adj.labels.map((label, i) =>
    '<tr><td class="rowlbl">' + label + '</td>' +
    adj.cells[i].map(v => '<td class="' + (v > 0 ? 'nz' : '') + '">' + v + '</td>').join('') +
    '</tr>'
  ).join('');
  document.getElementById('adjwrap').innerHTML = '<table id="adj"><thead>' + head + '</thead><tbody>' + body + '</tbody></table>';
}

document.getElementById('apply').addEventListener('click', refresh);

if (EMBEDDED) {
  setControls(EMBEDDED.params);
  ['sizeMetric', 'edgeWidth', 'physics', 'connectedOnly', 'minFee'].forEach(id => {
    document.getElementById(id).disabled = true;
  });
  document.getElementById('apply').style.display = 'none';
  document.getElementById('frozen').style.display = 'block';
}
refresh();
</script>
</body>
</html>"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_appears_exactly_once() {
        assert_eq!(DASHBOARD_HTML.matches(DATA_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn live_page_has_no_placeholder_left() {
        let page = render_live();
        assert!(!page.contains(DATA_PLACEHOLDER));
        assert!(page.contains("const EMBEDDED = null;"));
    }
}
