//! Search and ordering used by the public catalog and the admin list.

use std::cmp::Ordering;

use crate::product::PricedProduct;

/// Case-insensitive substring match on the product name. An empty term matches everything.
pub fn matches_search(name: &str, term: &str) -> bool {
    let term = term.trim();
    term.is_empty() || name.to_lowercase().contains(&term.to_lowercase())
}

/// Alphabetical order ignoring case and Portuguese accents ("Águia" sorts with "aguia").
pub fn compare_names(a: &str, b: &str) -> Ordering {
    fold_name(a).cmp(&fold_name(b))
}

pub fn sort_by_name(products: &mut [PricedProduct]) {
    products.sort_by(|a, b| compare_names(&a.product.name, &b.product.name));
}

/// Filter by `term`, then sort by name.
pub fn search_and_sort(products: Vec<PricedProduct>, term: &str) -> Vec<PricedProduct> {
    let mut found: Vec<PricedProduct> = products
        .into_iter()
        .filter(|p| matches_search(&p.product.name, term))
        .collect();
    sort_by_name(&mut found);
    found
}

fn fold_name(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(strip_accent)
        .collect()
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}
