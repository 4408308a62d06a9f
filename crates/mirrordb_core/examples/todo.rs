//! Basic MirrorDB Example - Todo List
//!
//! This example demonstrates core MirrorDB functionality:
//! - Opening a store over a directory
//! - Inserting records (each one mirrored to its own JSON file)
//! - Tracked field mutations and change hooks
//! - Domain operations as field patches
//! - Bounded undo
//!
//! Run with: cargo run -p mirrordb_core --example todo

use mirrordb_core::{json, FieldPatch, Store, StoreResult};
use serde::{Deserialize, Serialize};

/// A simple todo item record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Todo {
    id: String,
    title: String,
    completed: bool,
    priority: u8,
}

impl Todo {
    fn new(id: &str, title: &str, priority: u8) -> Self {
        Self {
            id: id.to_owned(),
            title: title.to_owned(),
            completed: false,
            priority,
        }
    }

    /// Completing a todo is a command: it describes the intended field
    /// change and the store applies and logs it.
    fn complete(&self) -> FieldPatch {
        FieldPatch::new().with("completed", true)
    }
}

fn main() -> StoreResult<()> {
    tracing_subscriber::fmt::init();

    println!("Todo List Example");
    println!("=================\n");

    let dir = std::env::temp_dir().join("mirrordb_todo_example");
    let mut store: Store<Todo> = Store::open(&dir)?;
    store.clear()?;
    println!("[OK] Store opened at {}", dir.display());

    // Observe every mutation batch.
    store.add_change_hook(|proxy, changes| {
        println!("  [hook] {} -> {} change(s)", proxy.key(), changes.len());
    });

    // Insert some todos; each lands in its own file immediately.
    println!("\n[+] Inserting todos...");
    for todo in [
        Todo::new("t1", "Learn MirrorDB", 1),
        Todo::new("t2", "Build an app", 2),
        Todo::new("t3", "Write tests", 1),
    ] {
        store.set(todo)?;
    }

    // List them.
    println!("\n[*] All todos:");
    for proxy in store.values()? {
        let status = if proxy.completed { "x" } else { " " };
        println!("  [{}] P{} {}", status, proxy.priority, proxy.title);
    }

    // Tracked single-field edit.
    println!("\n[~] Bumping priority of 'Build an app'...");
    store.set_field("t2", "priority", json!(1))?;

    // Domain operation through a field patch.
    println!("\n[~] Completing 'Learn MirrorDB'...");
    store.apply("t1", Todo::complete)?;

    // High-priority incomplete todos via a linear scan.
    println!("\n[!] High-priority incomplete todos:");
    for proxy in store.filter(|t| !t.completed && t.priority == 1)? {
        println!("  [ ] {}", proxy.title);
    }

    // Undo the completion.
    println!("\n[<] Undoing the completion...");
    store.reset("t1", 1)?;
    let learn = store.get_record("t1")?.expect("t1 exists");
    println!("  completed = {}", learn.completed);

    // Delete one and sum up.
    store.delete("t3")?;
    println!("\n[#] Summary:");
    println!("  Records: {}", store.len());
    println!("  Changes logged: {}", store.change_count());

    store.clear()?;
    println!("\n[*] Store cleared");
    Ok(())
}
