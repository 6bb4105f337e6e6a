use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::event::Event;

/// Async loader for Woopra's front-end library, verbatim from the vendor.
const LOADER_JS: &str = r#"(function(){
var t,i,e,n=window,o=document,a=arguments,s="script",r=["config","track","identify","visit","push","call"],c=function(){var t,i=this;for(i._e=[],t=0;r.length>t;t++)(function(t){i[t]=function(){return i._e.push([t].concat(Array.prototype.slice.call(arguments,0))),i}})(r[t])};for(n._w=n._w||{},t=0;a.length>t;t++)n._w[a[t]]=n[a[t]]=n[a[t]]||new c;i=o.createElement(s),i.async=1,i.src="//static.woopra.com/js/w.js",e=o.getElementsByTagName(s)[0],e.parentNode.insertBefore(i,e)
})("woopra");"#;

pub(crate) fn render_config(pending: &Map<String, Value>) -> String {
    format!("woopra.config({});", Value::Object(pending.clone()))
}

pub(crate) fn render_identify(visitor: &BTreeMap<String, String>) -> String {
    format!("woopra.identify({});", json_map(visitor))
}

pub(crate) fn render_track(event: &Event) -> String {
    match event.name() {
        Some(name) => format!(
            "woopra.track({}, {});",
            Value::String(name.to_owned()),
            json_map(event.properties())
        ),
        None => "woopra.track();".to_string(),
    }
}

pub(crate) fn render_push() -> String {
    "woopra.push();".to_string()
}

/// A bare `<script>` block replaying already-buffered calls, used once
/// the main snippet is on the page.
pub(crate) fn script_block(calls: &[String]) -> String {
    let mut out = String::from("<script>\n");
    for call in calls {
        out.push_str(call);
        out.push('\n');
    }
    out.push_str("</script>\n");
    out
}

/// The full Woopra snippet: loader plus the replayed calls.
pub(crate) fn widget_block(calls: &[String]) -> String {
    let mut out = String::from("<!-- Woopra code starts here -->\n<script>\n");
    out.push_str(LOADER_JS);
    out.push('\n');
    for call in calls {
        out.push_str(call);
        out.push('\n');
    }
    out.push_str("</script>\n<!-- Woopra code ends here -->\n");
    out
}

fn json_map(map: &BTreeMap<String, String>) -> String {
    let object: Map<String, Value> = map
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(object).to_string()
}
