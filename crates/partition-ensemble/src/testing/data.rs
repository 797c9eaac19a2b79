use ndarray::Array1;
use rand::prelude::*;

use crate::frame::{Column, Frame, FrameError};

/// Synthetic retail orders for end-to-end tests.
///
/// Both frames carry `orderID, articleID, customerID, voucherID,
/// productGroup, colorCode, sizeCode, quantity, price, returnQuantity`.
/// Test identifiers are drawn from wider ranges than training identifiers,
/// so the test set mixes known and unknown values; `voucherID` is sometimes
/// missing. Returns are more likely for expensive items. Test index labels
/// start at 1000.
pub fn retail_frames(n_train: usize, n_test: usize, seed: u64) -> Result<(Frame, Frame), FrameError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let train = orders(n_train, 0, 8, 10, 3, 4, &mut rng)?;
    let test = orders(n_test, 1000, 12, 15, 5, 5, &mut rng)?;
    Ok((train, test))
}

fn orders(
    n: usize,
    first_index: usize,
    articles: usize,
    customers: usize,
    vouchers: usize,
    groups: usize,
    rng: &mut StdRng,
) -> Result<Frame, FrameError> {
    let mut order_id = Vec::with_capacity(n);
    let mut article = Vec::with_capacity(n);
    let mut customer = Vec::with_capacity(n);
    let mut voucher = Vec::with_capacity(n);
    let mut group = Vec::with_capacity(n);
    let mut color = Vec::with_capacity(n);
    let mut size = Vec::with_capacity(n);
    let mut quantity = Vec::with_capacity(n);
    let mut price = Vec::with_capacity(n);
    let mut returns = Vec::with_capacity(n);

    for i in 0..n {
        order_id.push((i / 3) as f64);
        article.push(Some(format!("A{}", rng.gen_range(0..articles))));
        customer.push(rng.gen_range(0..customers) as f64);
        voucher.push(if rng.r#gen::<f64>() < 0.2 {
            None
        } else {
            Some(format!("V{}", rng.gen_range(0..vouchers)))
        });
        group.push(rng.gen_range(0..groups) as f64);
        color.push(rng.gen_range(0..6) as f64);
        size.push(Some(["S", "M", "L", "XL"][rng.gen_range(0..4)].to_string()));
        quantity.push(rng.gen_range(1..3) as f64);

        let p = 10.0 + rng.r#gen::<f64>() * 90.0;
        price.push(p);
        let returned = if p > 60.0 {
            rng.r#gen::<f64>() < 0.8
        } else {
            rng.r#gen::<f64>() < 0.15
        };
        returns.push(if returned { rng.gen_range(1..3) as f64 } else { 0.0 });
    }

    let columns = [
        ("orderID", Column::Numeric(Array1::from(order_id))),
        ("articleID", Column::Text(article)),
        ("customerID", Column::Numeric(Array1::from(customer))),
        ("voucherID", Column::Text(voucher)),
        ("productGroup", Column::Numeric(Array1::from(group))),
        ("colorCode", Column::Numeric(Array1::from(color))),
        ("sizeCode", Column::Text(size)),
        ("quantity", Column::Numeric(Array1::from(quantity))),
        ("price", Column::Numeric(Array1::from(price))),
        ("returnQuantity", Column::Numeric(Array1::from(returns))),
    ];
    columns
        .into_iter()
        .fold(Frame::builder(), |builder, (name, column)| builder.column(name, column))
        .index(first_index..first_index + n)
        .build()
}
