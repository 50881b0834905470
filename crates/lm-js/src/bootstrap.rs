/// Installed once per context before any editor script runs.
pub(crate) const BOOTSTRAP_ENV: &str = r#"
globalThis.window = globalThis;
globalThis.self = globalThis;
globalThis.console = {
  log: function () {},
  warn: function () {},
  error: function () {}
};
globalThis.__lm_timer_queue = [];
globalThis.__lm_timer_cancelled = {};
globalThis.__lm_next_timer_id = 1;
globalThis.setTimeout = function (callback, _delay) {
  if (typeof callback !== "function") {
    return 0;
  }
  var id = globalThis.__lm_next_timer_id++;
  globalThis.__lm_timer_queue.push({ id: id, cb: callback });
  return id;
};
globalThis.clearTimeout = function (id) {
  globalThis.__lm_timer_cancelled[String(id)] = true;
};
globalThis.queueMicrotask = function (callback) {
  return globalThis.setTimeout(callback, 0);
};
globalThis.__lm_flush_timers = function (limit) {
  var maxRuns = Number(limit) || 1;
  var runs = 0;
  while (globalThis.__lm_timer_queue.length > 0 && runs < maxRuns) {
    var task = globalThis.__lm_timer_queue.shift();
    var cancelled = !!globalThis.__lm_timer_cancelled[String(task.id)];
    delete globalThis.__lm_timer_cancelled[String(task.id)];
    if (!cancelled) {
      task.cb();
    }
    runs++;
  }
  return runs;
};

globalThis.__lm_outbox = [];
globalThis.postToHost = function (channel, payload) {
  globalThis.__lm_outbox.push({
    channel: String(channel),
    payload: payload === undefined ? null : payload
  });
};
globalThis.__lm_drain_outbox = function () {
  var out = globalThis.__lm_outbox;
  globalThis.__lm_outbox = [];
  return JSON.stringify(out);
};

globalThis.__lm_replacement = null;
globalThis.editor = {
  html: "",
  text: "",
  selectionText: "",
  replaceHtml: function (html) {
    globalThis.__lm_replacement = String(html);
    this.html = globalThis.__lm_replacement;
  }
};
globalThis.__lm_set_editor = function (state) {
  globalThis.editor.html = state.html;
  globalThis.editor.text = state.text;
  globalThis.editor.selectionText = state.selectionText;
  globalThis.__lm_replacement = null;
};
globalThis.__lm_take_replacement = function () {
  var value = globalThis.__lm_replacement;
  globalThis.__lm_replacement = null;
  return value;
};
"#;
