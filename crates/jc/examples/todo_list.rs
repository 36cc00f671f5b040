//! Todo list example - building and wiring a small page while it loads

use jc::{Document, DocumentConfig, Element, Event, Handler, Jc, ReadyState};
use std::rc::Rc;

const PAGE: &str = r#"
<!DOCTYPE html>
<html>
  <body>
    <h1>Todo</h1>
    <ul id="items"></ul>
  </body>
</html>
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = DocumentConfig {
        ready_state: ReadyState::Loading,
        ..DocumentConfig::default()
    };
    let doc = Document::parse_html(PAGE, config)?;
    let jc = Jc::new(&doc);

    jc.ready(|| println!("Document ready"))?;

    let list = jc.select("#items")?;
    for (i, label) in ["write docs", "fix bug", "ship"].iter().enumerate() {
        let index = i.to_string();
        let item = jc.create("li", &[("data-index", index.as_str())], None)?;
        item.set_text(label)?.add_class("todo")?;
        list.append(&item)?;
    }

    let toggle: Handler = Rc::new(|element: &Element, _event: &Event| {
        let done = element.has_class("done").unwrap_or(false);
        let doc = element.document();
        let result = if done {
            doc.class_list_remove(element.id(), "done")
        } else {
            doc.class_list_add(element.id(), "done")
        };
        if let Err(e) = result {
            eprintln!("toggle failed: {}", e);
        }
    });
    let items = jc.select("li.todo")?;
    items.on("click", &toggle)?;

    doc.set_ready_state(ReadyState::Interactive)?;
    doc.set_ready_state(ReadyState::Complete)?;

    // Simulate clicks on the second item
    let second = items[1];
    doc.dispatch_event(second, "click", true)?;
    println!("After one click: {}", doc.outer_html(second)?);
    doc.dispatch_event(second, "click", true)?;
    println!("After two clicks: {}", doc.outer_html(second)?);

    items.off("click", &toggle)?;
    doc.dispatch_event(second, "click", true)?;
    println!("After unbinding: {}", doc.outer_html(second)?);

    println!("Labels: {:?}", items.text()?.into_vec());
    println!("{}", doc.inner_html(list[0])?);

    Ok(())
}
