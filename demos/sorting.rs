//! Sorting Example
//!
//! This example demonstrates:
//! - Sorting a view by one column, then by several
//! - Header activation with the additive modifier
//! - Live edits reaching the view as translated notifications
//! - A sort surviving a column being moved
//!
//! Run with `RUST_LOG=debug` to see index rebuilds and reconciliation.

use sortview::{Activation, Schema, SortableView, Table, Value, ValueKind};
use std::cell::RefCell;
use std::rc::Rc;

fn print_view(view: &SortableView<Table>) {
    let headers: Vec<String> = (0..view.column_count())
        .map(|c| view.column_name(c).unwrap_or_default())
        .collect();
    println!("      {}", headers.join(" | "));
    for r in 0..view.row_count() {
        let cells: Vec<String> = (0..view.column_count())
            .map(|c| view.value_at(r, c).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        println!("      {}", cells.join(" | "));
    }
}

fn main() {
    env_logger::init();

    println!("=== SortView Sorting Example ===\n");

    // 1. Create a sales table
    println!("1. Creating sales table...");
    let schema = Schema::new(vec![
        ("product".to_string(), ValueKind::String, false),
        ("category".to_string(), ValueKind::String, false),
        ("price".to_string(), ValueKind::Float64, true),
        ("quantity".to_string(), ValueKind::Int32, false),
    ]);

    let table = Rc::new(RefCell::new(Table::new("sales".to_string(), schema)));
    {
        let mut t = table.borrow_mut();

        let items = vec![
            ("Laptop", "Electronics", Some(999.99), 5),
            ("Mouse", "Electronics", Some(29.99), 20),
            ("Desk", "Furniture", Some(299.99), 3),
            ("Chair", "Furniture", None, 8),
            ("Monitor", "Electronics", Some(399.99), 10),
        ];

        for (product, category, price, quantity) in items {
            t.push_row(vec![product.into(), category.into(), price.into(), quantity.into()])
                .unwrap();
        }
    }
    println!("   Added {} products\n", table.borrow().len());

    let mut view = SortableView::new("catalog".to_string(), table.clone());
    view.subscribe(|change| println!("   -> {:?}", change));

    // 2. Sort by price
    println!("2. Sorting by price (nulls first)...");
    view.activate(2, Activation::plain());
    print_view(&view);
    println!();

    // 3. Compound sort
    println!("3. Sorting by category, then price descending...");
    view.activate(1, Activation::plain());
    view.activate(2, Activation::additive());
    view.activate(2, Activation::additive());
    for (column, direction) in view.sort_keys() {
        println!(
            "   key: {} {:?}",
            view.column_name(column).unwrap_or_default(),
            direction
        );
    }
    print_view(&view);
    println!();

    // 4. Live edits
    println!("4. Editing cells...");
    // Building the inverse lets edits outside the sort keys skip re-sorting
    view.view_index_of(0);
    table.borrow_mut().set_value(3, "quantity", Value::Int32(12)).unwrap();
    view.sync();
    table
        .borrow_mut()
        .set_value(1, "price", Value::Float64(1499.0))
        .unwrap();
    view.sync();
    print_view(&view);
    println!();

    // 5. Structural change
    println!("5. Moving 'price' to the front...");
    table.borrow_mut().move_column("price", 0).unwrap();
    view.sync();
    println!(
        "   price is now view column 0, sorted {:?}",
        view.sort_direction_of(0)
    );
    print_view(&view);
    println!();

    // 6. Editing through the view
    println!("6. Writing through the view...");
    let top = view.model_index_of(0).unwrap();
    view.set_value_at(0, 0, Value::Float64(9.99)).unwrap();
    println!(
        "   model row {} now costs {}",
        top,
        table.borrow().get_value(top, "price").unwrap()
    );
    print_view(&view);
    println!();

    // 7. Back to source order
    println!("7. Cancelling the sort...");
    view.cancel_sorting();
    print_view(&view);

    println!("\n=== Example Complete ===");
}
