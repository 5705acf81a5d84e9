use crate::model::BenchmarkReport;

/// Render a self-contained HTML report (data embedded as JSON).
///
/// Important: we avoid `format!()` because the HTML contains many `{}` from JS
/// template literals (e.g., `${x}`), which would conflict with Rust formatting.
pub fn render_html_report(report: &BenchmarkReport) -> anyhow::Result<String> {
    // `</` would close the script element early.
    let json = serde_json::to_string(report)?.replace("</", "<\\/");

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Benchmark report</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  .container { display: flex; height: calc(100vh - 58px); }
  .sidebar { width: 320px; border-right: 1px solid #ddd; padding: 12px; overflow: auto; }
  .main { flex: 1; padding: 12px; overflow: auto; }

  .summary { display: flex; gap: 16px; flex-wrap: wrap; font-size: 14px; color: #333; }
  .pill { padding: 4px 8px; border: 1px solid #ddd; border-radius: 999px; background: #fafafa; }

  .entry { cursor: pointer; user-select: none; padding: 2px 4px; border-radius: 4px; }
  .entry:hover { background: #f3f3f3; }
  .entry.selected { background: #e9f2ff; border: 1px solid #cfe3ff; }
  .section { margin-top: 10px; font-weight: 600; font-size: 13px; color: #555; }
  .muted { color: #777; font-size: 12px; }

  svg { border: 1px solid #eee; background: white; }
  .legend span { display: inline-block; margin-right: 12px; font-size: 13px; }
  .swatch { display: inline-block; width: 12px; height: 3px; margin-right: 4px; vertical-align: middle; }

  table { border-collapse: collapse; width: 100%; margin-top: 8px; }
  th, td { border-bottom: 1px solid #eee; padding: 6px 8px; text-align: left; font-size: 14px; }
  th { position: sticky; top: 0; background: white; border-bottom: 1px solid #ddd; }
  .num { text-align: right; font-variant-numeric: tabular-nums; }
</style>
</head>
<body>
<header>
  <div class="summary" id="summary"></div>
</header>

<div class="container">
  <div class="sidebar">
    <input id="search" placeholder="Search instance..." style="width: 100%; box-sizing: border-box; padding: 6px 8px; border: 1px solid #ddd; border-radius: 6px;">
    <div id="views"></div>
  </div>

  <div class="main">
    <h2 id="title"></h2>
    <div id="legend" class="legend"></div>
    <svg id="chart" width="900" height="420"></svg>
    <div id="tableWrap"></div>
  </div>
</div>

<script>
// Embedded report data (JSON object literal)
const DATA = __DATA__;

const COLORS = ["#1f77b4", "#d62728", "#2ca02c", "#ff7f0e", "#9467bd", "#8c564b", "#e377c2", "#17becf"];

const state = {
  selected: null,
  search: ""
};

function fmt(x) {
  if (x === null || x === undefined) return "";
  if (typeof x !== "number") return String(x);
  return (Math.round(x * 1000) / 1000).toString();
}

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function renderSummary() {
  const el = document.getElementById("summary");
  el.innerHTML = `
    <span class="pill">mode: <b>${escapeHtml(DATA.mode)}</b></span>
    <span class="pill">instances: <b>${DATA.instance_count}</b></span>
    <span class="pill">time limit: <b>${fmt(DATA.time_limit)}</b></span>
    <span class="pill">resolution: <b>${DATA.resolution}</b></span>
    <span class="pill">labels: <b>${DATA.labels.map(escapeHtml).join(" VS ")}</b></span>
    <span class="pill">diagnostics: <b>${DATA.diagnostics.length}</b></span>
  `;
}

// Each view is { key, title, xs, xmax, ymax, series: [{ name, ys }] } or a table.
function aggregateViews() {
  const views = [];
  const has = (f) => DATA.profiles.some((p) => p[f]);
  if (has("solved")) {
    views.push({
      key: "solved", title: "Solved by time", xs: DATA.times, xmax: DATA.time_limit, ymax: DATA.instance_count,
      series: DATA.profiles.filter((p) => p.solved).map((p) => ({ name: p.label, ys: p.solved }))
    });
  }
  if (has("gap_profile")) {
    views.push({
      key: "gap_profile", title: "Instances by gap", xs: DATA.gap_axis, xmax: 1, ymax: DATA.instance_count,
      series: DATA.profiles.filter((p) => p.gap_profile).map((p) => ({ name: p.label, ys: p.gap_profile }))
    });
  }
  if (has("mean_gap_curve")) {
    views.push({
      key: "mean_gap", title: "Mean gap", xs: DATA.times, xmax: DATA.time_limit, ymax: 1,
      series: DATA.profiles.filter((p) => p.mean_gap_curve).map((p) => ({ name: p.label + " / Gap", ys: p.mean_gap_curve }))
    });
  }
  views.push({ key: "summary", title: "Summary table", table: "summary" });
  views.push({ key: "diagnostics", title: "Diagnostics", table: "diagnostics" });
  return views;
}

function instanceView(inst) {
  const series = [];
  for (const [label, tracks] of inst.labels) {
    if (!tracks) continue;
    series.push({ name: label + " / Primal", ys: tracks.primal });
    if (DATA.mode === "primaldual") series.push({ name: label + " / Dual", ys: tracks.dual });
  }
  if (inst.best_known_solution !== null) {
    series.push({ name: "Best known solution", ys: DATA.times.map(() => inst.best_known_solution) });
  }
  let ymax = 0;
  let ymin = 0;
  for (const s of series) for (const y of s.ys) if (y !== null) { ymax = Math.max(ymax, y); ymin = Math.min(ymin, y); }
  return {
    key: "instance:" + inst.dataset + "/" + inst.path, title: inst.dataset + "/" + inst.path,
    xs: DATA.times, xmax: DATA.time_limit, ymin, ymax: ymax || 1, series
  };
}

function drawChart(view) {
  const svg = document.getElementById("chart");
  const W = +svg.getAttribute("width"), H = +svg.getAttribute("height");
  const m = { l: 60, r: 16, t: 12, b: 36 };
  const ymin = view.ymin || 0;
  const sx = (x) => m.l + (x / view.xmax) * (W - m.l - m.r);
  const sy = (y) => H - m.b - ((y - ymin) / ((view.ymax - ymin) || 1)) * (H - m.t - m.b);

  let body = `<line x1="${m.l}" y1="${H - m.b}" x2="${W - m.r}" y2="${H - m.b}" stroke="#999"/>`;
  body += `<line x1="${m.l}" y1="${m.t}" x2="${m.l}" y2="${H - m.b}" stroke="#999"/>`;
  for (let k = 0; k <= 4; k++) {
    const x = view.xmax * k / 4, y = ymin + (view.ymax - ymin) * k / 4;
    body += `<text x="${sx(x)}" y="${H - m.b + 16}" font-size="11" text-anchor="middle">${fmt(x)}</text>`;
    body += `<text x="${m.l - 6}" y="${sy(y) + 4}" font-size="11" text-anchor="end">${fmt(y)}</text>`;
  }

  view.series.forEach((s, i) => {
    // Steps: hold each sample until the next one; undefined samples break the line.
    let d = "";
    let pen = false;
    for (let j = 0; j < s.ys.length; j++) {
      const y = s.ys[j];
      if (y === null) { pen = false; continue; }
      const x0 = sx(view.xs[j]), x1 = sx(view.xs[Math.min(j + 1, s.ys.length - 1)]);
      d += (pen ? "L" : "M") + x0 + " " + sy(y) + " L" + x1 + " " + sy(y) + " ";
      pen = true;
    }
    body += `<path d="${d}" fill="none" stroke="${COLORS[i % COLORS.length]}" stroke-width="1.5"/>`;
  });
  svg.innerHTML = body;
  svg.style.display = "block";

  document.getElementById("legend").innerHTML = view.series
    .map((s, i) => `<span><span class="swatch" style="background:${COLORS[i % COLORS.length]}"></span>${escapeHtml(s.name)}</span>`)
    .join("");
}

function renderTable(kind) {
  document.getElementById("chart").style.display = "none";
  document.getElementById("legend").innerHTML = "";
  let columns, rows;
  if (kind === "summary") {
    columns = DATA.summary.columns;
    rows = DATA.summary.rows.concat([DATA.summary.aggregate]);
  } else {
    columns = ["kind", "label", "dataset", "path", "message"];
    rows = DATA.diagnostics;
  }
  let html = "<table><thead><tr>" + columns.map((c) => `<th>${escapeHtml(c)}</th>`).join("") + "</tr></thead><tbody>";
  for (const row of rows) {
    html += "<tr>" + columns.map((c) => {
      const v = row[c];
      const cls = typeof v === "number" ? " class=\"num\"" : "";
      return `<td${cls}>${escapeHtml(fmt(v))}</td>`;
    }).join("") + "</tr>";
  }
  html += "</tbody></table>";
  document.getElementById("tableWrap").innerHTML = html;
}

function allViews() {
  return aggregateViews().concat(DATA.instances.map(instanceView));
}

function select(key) {
  state.selected = key;
  const view = allViews().find((v) => v.key === key);
  if (!view) return;
  document.getElementById("title").textContent = view.title;
  document.getElementById("tableWrap").innerHTML = "";
  if (view.table) renderTable(view.table);
  else drawChart(view);
  renderViews();
}

function renderViews() {
  const root = document.getElementById("views");
  root.innerHTML = "";

  function entry(view) {
    const row = document.createElement("div");
    row.className = "entry" + (state.selected === view.key ? " selected" : "");
    row.textContent = view.title;
    row.onclick = () => select(view.key);
    root.appendChild(row);
  }

  const header = (text) => {
    const h = document.createElement("div");
    h.className = "section";
    h.textContent = text;
    root.appendChild(h);
  };

  header("Aggregate");
  for (const v of aggregateViews()) entry(v);

  if (DATA.instances.length) {
    header("Instances");
    const s = state.search.toLowerCase();
    for (const inst of DATA.instances) {
      const v = instanceView(inst);
      if (s && !v.title.toLowerCase().includes(s)) continue;
      entry(v);
    }
  }
}

document.getElementById("search").addEventListener("input", (e) => {
  state.search = e.target.value || "";
  renderViews();
});

renderSummary();
renderViews();
select(aggregateViews()[0].key);
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace("__DATA__", &json))
}
