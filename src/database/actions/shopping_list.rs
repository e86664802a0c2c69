use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::{
    constants::{SHOPPING_LIST_FILENAME, SHOPPING_LIST_HEADER},
    error::{ApiError, QueryError},
    schema::{CartLine, ShoppingListEntry, ShoppingListFile},
};

/// Renders the user's whole cart as a downloadable text file. Amounts of
/// the same ingredient are summed across recipes, but only when the unit
/// matches as well. An empty cart is the EmptyCart error, not an empty
/// file.
pub async fn export_shopping_list(
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<ShoppingListFile, ApiError> {
    let lines: Vec<CartLine> = sqlx::query_as(
        "
        SELECT i.name AS name, u.name AS measurement_unit, ri.amount AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        LEFT JOIN units u ON u.id = i.unit_id
        WHERE sc.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if lines.is_empty() {
        return Err(ApiError::EmptyCart);
    }

    let entries = reduce_cart_lines(lines);

    Ok(ShoppingListFile {
        filename: SHOPPING_LIST_FILENAME.to_string(),
        content: render_shopping_list(&entries),
    })
}

/// Sums raw cart lines into one entry per (name, unit) pair, ordered by
/// name and then unit. Totals are widened to i64 so a large cart cannot
/// overflow.
pub fn reduce_cart_lines(lines: Vec<CartLine>) -> Vec<ShoppingListEntry> {
    let mut totals: HashMap<(String, Option<String>), i64> = HashMap::new();
    for line in lines {
        *totals
            .entry((line.name, line.measurement_unit))
            .or_insert(0) += i64::from(line.amount);
    }

    let mut entries: Vec<ShoppingListEntry> = totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingListEntry {
            name,
            measurement_unit,
            total,
        })
        .collect();
    entries.sort_by(|a, b| {
        (&a.name, &a.measurement_unit).cmp(&(&b.name, &b.measurement_unit))
    });

    entries
}

/// One header line, then `name (unit) - total` per entry. A unitless
/// ingredient renders its unit as `-`.
pub fn render_shopping_list(entries: &[ShoppingListEntry]) -> String {
    let mut content = String::from(SHOPPING_LIST_HEADER);
    content.push('\n');

    for entry in entries {
        let unit = entry.measurement_unit.as_deref().unwrap_or("-");
        content.push_str(&format!("{} ({}) - {}\n", entry.name, unit, entry.total));
    }

    content
}
