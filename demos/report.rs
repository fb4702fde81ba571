use reckon::computations::*;
use reckon::diagnostics::{Blueprint, report};
use reckon::{Label, Outcome};

/// This demo builds a small graph of order checks, evaluates it, and
/// reports every failure at once instead of stopping at the first one.
///
/// Run with:
///   cargo run --example report --features logging
#[derive(Clone)]
struct Order {
    id: u32,
    quantity: i64,
    unit_price: i64,
}

fn main() -> anyhow::Result<()> {
    reckon::logging::init();

    let orders = vec![
        Order { id: 1, quantity: 3, unit_price: 250 },
        Order { id: 2, quantity: 0, unit_price: 100 },
        Order { id: 3, quantity: 2, unit_price: -5 },
    ];

    let validate = lift_flat_map(Label::new("orders", "validate"), |order: Order| {
        if order.quantity <= 0 {
            return Outcome::empty(reckon::Cause::absent(format!("order {} has no items", order.id)));
        }
        Outcome::present(order)
    });

    let price = lift_try_map(Label::new("orders", "price"), |order: Order| {
        anyhow::ensure!(order.unit_price >= 0, "order {} has a negative price", order.id);
        Ok(order.quantity * order.unit_price)
    });

    let totals: Vec<_> = orders
        .into_iter()
        .map(|order| price(&validate(&lift(order))))
        .collect();

    let graph = all_of(totals);

    println!("{}", Blueprint::of(&graph).render_mermaid());

    match graph.compute() {
        Outcome::Present(totals) => println!("grand total: {}", totals.iter().sum::<i64>()),
        Outcome::Empty(causes) => {
            report(&causes);
            println!("{} order(s) could not be priced", causes.len());
        }
    }

    Ok(())
}
