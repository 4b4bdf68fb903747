use rust_decimal::Decimal;

pub fn line_subtotal(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}

pub fn order_total<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .map(|(price, quantity)| line_subtotal(price, quantity))
        .sum()
}
