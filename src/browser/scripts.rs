//! In-page scripts.
//!
//! Each constant is the body of an `async (args) => { ... }` function; the
//! constructors below pair it with its name and JSON arguments. Scripts other
//! than [`geometry`] and the scroll helpers rely on the `window.__pagetopdf`
//! namespace installed by [`bootstrap`].

use serde_json::json;

use super::context::{NodeId, PageScript};

const BOOTSTRAP: &str = r#"
if (window.__pagetopdf) return false;
const nodes = new Map();
const ids = new WeakMap();
const collected = new FinalizationRegistry((id) => nodes.delete(id));
let next = 1;
window.__pagetopdf = {
  rules: [],
  network: null,
  observer: null,
  nativeRemove: Element.prototype.remove,
  nativeRemoveChild: Node.prototype.removeChild,
  idOf(el) {
    let id = ids.get(el);
    if (id === undefined) {
      id = next++;
      ids.set(el, id);
      nodes.set(id, new WeakRef(el));
      collected.register(el, id);
    }
    return id;
  },
  nodeOf(id) {
    const el = nodes.get(id)?.deref();
    if (el === undefined) nodes.delete(id);
    return el;
  },
};
return true;
"#;

const GEOMETRY: &str = r#"
const body = document.body;
if (!body) return null;
return {
  height: Math.max(body.offsetHeight, body.scrollHeight),
  width: Math.max(body.offsetWidth, body.scrollWidth),
};
"#;

const SCROLL_TO: &str = r#"
window.scrollTo(0, args.y);
return null;
"#;

const SCROLL_BY: &str = r#"
window.scrollBy(0, args.dy);
return null;
"#;

const WINDOW_METRICS: &str = r#"
return { innerWidth: window.innerWidth, innerHeight: window.innerHeight };
"#;

const NETWORK_PROBE_INSTALL: &str = r#"
const ns = window.__pagetopdf;
if (ns.network) return false;
const probe = { triggered: false, send: XMLHttpRequest.prototype.send, fetch: window.fetch };
XMLHttpRequest.prototype.send = function (...rest) {
  probe.triggered = true;
  return probe.send.apply(this, rest);
};
if (typeof probe.fetch === 'function') {
  window.fetch = function (...rest) {
    probe.triggered = true;
    return probe.fetch.apply(this, rest);
  };
}
ns.network = probe;
return true;
"#;

const NETWORK_PROBE_FINISH: &str = r#"
const ns = window.__pagetopdf;
const probe = ns.network;
if (!probe) return false;
XMLHttpRequest.prototype.send = probe.send;
if (typeof probe.fetch === 'function') window.fetch = probe.fetch;
ns.network = null;
return probe.triggered;
"#;

const REMOVAL_POLICY: &str = r#"
const ns = window.__pagetopdf;
if (args.suppress) {
  Element.prototype.remove = function () {};
  Node.prototype.removeChild = function (child) { return child; };
} else {
  Element.prototype.remove = ns.nativeRemove;
  Node.prototype.removeChild = ns.nativeRemoveChild;
}
return null;
"#;

const OBSERVE_CLASS_MUTATIONS: &str = r#"
const ns = window.__pagetopdf;
if (ns.observer) return false;
const notify = window[args.binding];
ns.observer = new MutationObserver((mutations) => {
  for (const m of mutations) {
    if (m.attributeName !== 'class') continue;
    notify(JSON.stringify({ node: ns.idOf(m.target), attribute: m.attributeName, oldValue: m.oldValue }));
  }
});
ns.observer.observe(document.body, {
  attributes: true,
  attributeOldValue: true,
  attributeFilter: ['class'],
  subtree: true,
});
return true;
"#;

const REVERT_CLASS: &str = r#"
const el = window.__pagetopdf.nodeOf(args.node);
if (!el) return false;
if (args.value === null) {
  el.removeAttribute('class');
} else {
  el.className = args.value;
}
return true;
"#;

const POSITIONED_ELEMENTS: &str = r#"
const ns = window.__pagetopdf;
const out = [];
for (const el of document.getElementsByTagName('*')) {
  const style = getComputedStyle(el);
  if (style.position === 'static' || style.position === '') continue;
  out.push({ node: ns.idOf(el), position: style.position, zIndex: style.zIndex });
}
return out;
"#;

const REMOVE_NODES: &str = r#"
const ns = window.__pagetopdf;
let removed = 0;
for (const id of args.nodes) {
  const el = ns.nodeOf(id);
  if (!el) continue;
  ns.nativeRemove.call(el);
  removed++;
}
return removed;
"#;

const STYLESHEETS: &str = r#"
const ns = window.__pagetopdf;
ns.rules = [];
const breakProps = ['breakAfter', 'breakBefore', 'breakInside', 'pageBreakAfter', 'pageBreakBefore', 'pageBreakInside'];
const rulesOf = (owner) => {
  let list;
  try {
    list = owner.cssRules;
  } catch (e) {
    return null;
  }
  if (!list) return null;
  const out = [];
  for (let i = 0; i < list.length; i++) out.push(describeRule(list[i]));
  return out;
};
const describeSheet = (sheet) => (sheet ? { href: sheet.href || null, rules: rulesOf(sheet) } : null);
const describeRule = (rule) => {
  switch (rule.type) {
    case 1: {
      const id = ns.rules.push(rule) - 1;
      return {
        kind: 'style',
        id,
        selector: rule.selectorText,
        animation: rule.style.animation || null,
        declaresBreaks: breakProps.some((p) => !!rule.style[p]),
      };
    }
    case 4:
      return { kind: 'group', media: Array.from(rule.media), rules: rulesOf(rule) || [] };
    case 12:
      return { kind: 'group', media: null, rules: rulesOf(rule) || [] };
    case 3:
      return { kind: 'import', sheet: describeSheet(rule.styleSheet) };
    default:
      return { kind: 'other' };
  }
};
return Array.from(document.styleSheets, describeSheet);
"#;

const CLEAR_BREAKS: &str = r#"
const ns = window.__pagetopdf;
let cleared = 0;
for (const id of args.rules) {
  const rule = ns.rules[id];
  if (!rule) continue;
  rule.style.breakAfter = '';
  rule.style.breakBefore = '';
  rule.style.breakInside = '';
  rule.style.pageBreakAfter = '';
  rule.style.pageBreakBefore = '';
  rule.style.pageBreakInside = '';
  cleared++;
}
return cleared;
"#;

const FREEZE_ANIMATIONS: &str = r#"
const ns = window.__pagetopdf;
let frozen = 0;
let skipped = 0;
for (const id of args.rules) {
  const rule = ns.rules[id];
  if (!rule) continue;
  let matches;
  try {
    matches = document.querySelectorAll(rule.selectorText);
  } catch (e) {
    skipped++;
    continue;
  }
  for (const el of matches) {
    el.style.animationPlayState = 'paused';
    el.style.animationIterationCount = '0';
    frozen++;
  }
}
return { frozen, skipped };
"#;

pub fn bootstrap() -> PageScript {
    PageScript::new("bootstrap", BOOTSTRAP)
}

pub fn geometry() -> PageScript {
    PageScript::new("geometry", GEOMETRY)
}

pub fn scroll_to(y: u32) -> PageScript {
    PageScript::new("scroll_to", SCROLL_TO).with_args(json!({ "y": y }))
}

pub fn scroll_by(dy: u32) -> PageScript {
    PageScript::new("scroll_by", SCROLL_BY).with_args(json!({ "dy": dy }))
}

pub fn window_metrics() -> PageScript {
    PageScript::new("window_metrics", WINDOW_METRICS)
}

pub fn network_probe_install() -> PageScript {
    PageScript::new("network_probe_install", NETWORK_PROBE_INSTALL)
}

pub fn network_probe_finish() -> PageScript {
    PageScript::new("network_probe_finish", NETWORK_PROBE_FINISH)
}

pub fn removal_policy(suppress: bool) -> PageScript {
    PageScript::new("removal_policy", REMOVAL_POLICY).with_args(json!({ "suppress": suppress }))
}

pub fn observe_class_mutations(binding: &str) -> PageScript {
    PageScript::new("observe_class_mutations", OBSERVE_CLASS_MUTATIONS)
        .with_args(json!({ "binding": binding }))
}

pub fn revert_class(node: NodeId, value: Option<&str>) -> PageScript {
    PageScript::new("revert_class", REVERT_CLASS).with_args(json!({ "node": node, "value": value }))
}

pub fn positioned_elements() -> PageScript {
    PageScript::new("positioned_elements", POSITIONED_ELEMENTS)
}

pub fn remove_nodes(nodes: &[NodeId]) -> PageScript {
    PageScript::new("remove_nodes", REMOVE_NODES).with_args(json!({ "nodes": nodes }))
}

pub fn stylesheets() -> PageScript {
    PageScript::new("stylesheets", STYLESHEETS)
}

pub fn clear_breaks(rules: &[u32]) -> PageScript {
    PageScript::new("clear_breaks", CLEAR_BREAKS).with_args(json!({ "rules": rules }))
}

pub fn freeze_animations(rules: &[u32]) -> PageScript {
    PageScript::new("freeze_animations", FREEZE_ANIMATIONS).with_args(json!({ "rules": rules }))
}
