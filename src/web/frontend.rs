//! Embedded single-page frontend.
//!
//! Served at `/` so the service is usable without a separate frontend
//! deployment. Talks to the same `/api/*` endpoints a hosted frontend
//! would use.

/// The whole frontend: one page, inline CSS and JS, no build step.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>vydra · video downloader</title>
<style>
*{box-sizing:border-box;margin:0;padding:0}
body{background:#0d0d0d;min-height:100vh;display:flex;justify-content:center;align-items:center;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;padding:20px;color:#fff}
.card{background:rgba(255,255,255,.08);border:1px solid rgba(255,255,255,.12);border-radius:24px;padding:32px;max-width:560px;width:100%}
h1{font-size:1.6rem;font-weight:700;margin-bottom:4px}
.tagline{color:rgba(255,255,255,.55);font-size:.9rem;margin-bottom:24px}
.row{display:flex;gap:8px;margin-bottom:16px}
input,select{flex:1;padding:12px 14px;border-radius:12px;border:1px solid rgba(255,255,255,.2);background:rgba(0,0,0,.35);color:#fff;font-size:.95rem;outline:none}
input:focus,select:focus{border-color:rgba(255,255,255,.45)}
.btn{padding:12px 22px;border-radius:50px;border:none;background:#1DB954;color:#000;font-weight:600;font-size:.9rem;cursor:pointer;transition:opacity .15s;white-space:nowrap}
.btn:hover{opacity:.85}
.btn:disabled{opacity:.4;cursor:default}
.thumb{width:100%;border-radius:16px;box-shadow:0 8px 40px rgba(0,0,0,.6);margin-bottom:16px;display:block}
h2{font-size:1.1rem;font-weight:600;line-height:1.3;margin-bottom:16px}
.bar{height:10px;border-radius:5px;background:rgba(255,255,255,.12);overflow:hidden;margin-bottom:10px}
.bar-fill{height:100%;width:0%;border-radius:5px;background:#1DB954;transition:width .4s ease}
.message{color:rgba(255,255,255,.7);font-size:.85rem;text-align:center}
.error{background:rgba(255,60,68,.15);border:1px solid rgba(255,60,68,.4);color:#ff9a9e;border-radius:12px;padding:12px 14px;font-size:.85rem;margin-bottom:16px}
.hidden{display:none}
</style>
</head>
<body>
<div class="card">
<h1>&#129446; vydra</h1>
<p class="tagline">Download a video at the quality you want</p>
<div class="row">
<input id="url" type="text" placeholder="https://www.youtube.com/watch?v=..." autocomplete="off">
<button id="info-btn" class="btn">Get info</button>
</div>
<div id="error" class="error hidden"></div>
<div id="video" class="hidden">
<img id="thumb" class="thumb hidden" alt="">
<h2 id="title"></h2>
<div class="row">
<select id="quality"></select>
<button id="dl-btn" class="btn">Download</button>
</div>
</div>
<div id="progress" class="hidden">
<div class="bar"><div id="bar-fill" class="bar-fill"></div></div>
<p id="message" class="message"></p>
</div>
</div>
<script>
const $ = (id) => document.getElementById(id);
let pollTimer = null;

function showError(text) {
  const el = $("error");
  el.textContent = text;
  el.classList.remove("hidden");
}

function clearError() {
  $("error").classList.add("hidden");
}

async function getInfo() {
  clearError();
  $("video").classList.add("hidden");
  $("progress").classList.add("hidden");
  const url = $("url").value.trim();
  if (!url) { showError("Paste a video URL first."); return; }

  $("info-btn").disabled = true;
  try {
    const res = await fetch("/api/info", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ url })
    });
    const data = await res.json();
    if (!res.ok) { throw new Error(data.error || "Could not fetch video info."); }

    $("title").textContent = data.title;
    if (data.thumbnail) {
      $("thumb").src = data.thumbnail;
      $("thumb").classList.remove("hidden");
    } else {
      $("thumb").classList.add("hidden");
    }

    const select = $("quality");
    select.innerHTML = "";
    (data.qualities || []).forEach((q) => {
      const opt = document.createElement("option");
      opt.value = q;
      opt.textContent = q;
      select.appendChild(opt);
    });
    if (!select.options.length) { throw new Error("No video formats found for this URL."); }

    $("video").classList.remove("hidden");
  } catch (e) {
    showError(e.message);
  } finally {
    $("info-btn").disabled = false;
  }
}

async function startDownload() {
  clearError();
  const url = $("url").value.trim();
  const quality = $("quality").value;

  $("dl-btn").disabled = true;
  $("progress").classList.remove("hidden");
  $("bar-fill").style.width = "0%";
  $("message").textContent = "Initializing...";

  try {
    const res = await fetch("/api/download", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ url, quality_label: quality })
    });
    const data = await res.json();
    if (!res.ok) { throw new Error(data.error || "Could not start the download."); }
    pollTimer = setInterval(() => poll(data.task_id), 1000);
  } catch (e) {
    showError(e.message);
    $("dl-btn").disabled = false;
    $("progress").classList.add("hidden");
  }
}

async function poll(taskId) {
  try {
    const res = await fetch("/api/status/" + taskId);
    const data = await res.json();
    if (!res.ok) { throw new Error(data.error || "Task not found"); }

    $("bar-fill").style.width = data.progress + "%";
    $("message").textContent = data.message;

    if (data.status === "complete") {
      clearInterval(pollTimer);
      pollTimer = null;
      $("message").textContent = "Download complete! Saving file...";
      $("dl-btn").disabled = false;
      window.location.href = "/api/fetch/" + taskId;
    } else if (data.status === "error") {
      clearInterval(pollTimer);
      pollTimer = null;
      $("progress").classList.add("hidden");
      showError(data.message);
      $("dl-btn").disabled = false;
    }
  } catch (e) {
    clearInterval(pollTimer);
    pollTimer = null;
    $("progress").classList.add("hidden");
    showError(e.message);
    $("dl-btn").disabled = false;
  }
}

$("info-btn").addEventListener("click", getInfo);
$("dl-btn").addEventListener("click", startDownload);
$("url").addEventListener("keydown", (e) => { if (e.key === "Enter") getInfo(); });
</script>
</body>
</html>
"##;
