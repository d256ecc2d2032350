use crate::domain::model::{CartCommand, CartOp, ProductEntry, WeightEvent};
use crate::domain::ports::{CartStore, CatalogResolver};
use crate::utils::error::{Result, ShelfError};

/// 目錄查得的商品，加上層架是否吻合
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProduct {
    pub entry: ProductEntry,
    pub shelf_confirmed: bool,
}

pub fn resolve_product<R: CatalogResolver + ?Sized>(
    catalog: &R,
    event: &WeightEvent,
) -> Result<ResolvedProduct> {
    let entry = catalog
        .resolve(&event.product, event.shelf.as_deref())
        .ok_or_else(|| ShelfError::LookupError {
            product: event.product.clone(),
            shelf: event.shelf.clone(),
        })?;

    let shelf_confirmed = match (&entry.shelf, &event.shelf) {
        (Some(expected), Some(reported)) => expected == reported,
        _ => false,
    };

    Ok(ResolvedProduct {
        entry,
        shelf_confirmed,
    })
}

/// 商品不在車內才加入；已在車內就不重複加
pub fn fire_take<C: CartStore + ?Sized>(
    cart: &mut C,
    resolved: &ResolvedProduct,
    event: &WeightEvent,
) -> Result<CartCommand> {
    if cart.contains_product(&resolved.entry.product_id) {
        return Err(ShelfError::DuplicateSuppressed {
            product_id: resolved.entry.product_id.clone(),
            action: event.action.to_string(),
        });
    }

    let command = build_command(CartOp::Add, resolved, event);
    cart.apply(&command)?;
    Ok(command)
}

/// 車內有這項商品才移除，指向該筆的 cart_id
pub fn fire_put<C: CartStore + ?Sized>(
    cart: &mut C,
    resolved: &ResolvedProduct,
    event: &WeightEvent,
) -> Result<CartCommand> {
    let item = cart
        .find_product(&resolved.entry.product_id)
        .ok_or_else(|| ShelfError::DuplicateSuppressed {
            product_id: resolved.entry.product_id.clone(),
            action: event.action.to_string(),
        })?;

    let command = build_command(
        CartOp::Remove {
            cart_id: item.cart_id,
        },
        resolved,
        event,
    );
    cart.apply(&command)?;
    Ok(command)
}

fn build_command(op: CartOp, resolved: &ResolvedProduct, event: &WeightEvent) -> CartCommand {
    CartCommand {
        op,
        product: resolved.entry.clone(),
        timestamp: event.timestamp.clone(),
        weight_event: event.grams,
        shelf: event.shelf.clone(),
        shelf_confirmed: resolved.shelf_confirmed,
    }
}
