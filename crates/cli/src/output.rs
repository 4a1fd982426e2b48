use anyhow::Result;
use catalog::Product;
use console::{style, Term};
use recommend::{SectionRender, VisibleSection};
use serde_json::json;

/// Print one render pass; round 0 is the initial page, later rounds follow rotations
pub fn print_round(term: &Term, round: usize, renders: &[SectionRender], json: bool) -> Result<()> {
    if json {
        // одна строка JSON на раунд
        let line = serde_json::to_string(&json!({ "round": round, "sections": renders }))?;
        term.write_line(&line)?;
        return Ok(());
    }

    if round > 0 {
        term.write_line(&format!("{}", style(format!("── rotation {round} ──")).dim()))?;
    }

    let visible: Vec<&VisibleSection> = renders.iter().filter_map(|r| r.visible()).collect();
    if visible.is_empty() {
        term.write_line(&format!("{}", style("No recommendation sections to show").dim()))?;
        return Ok(());
    }

    for section in visible {
        term.write_line(&format_section(section))?;
    }
    Ok(())
}

pub fn format_section(section: &VisibleSection) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        style(&section.title).cyan().bold(),
        style(format!("[{}]", section.section_id)).dim()
    ));
    out.push_str(&format!("  {}\n", style(&section.description).italic()));

    for product in &section.products {
        out.push_str(&format!("  • {}\n", format_product(product)));
    }

    // короткий список повторяется в окне, считаем уникальные позиции
    let shown = section.products.len().min(section.total);
    let window = if section.can_rotate {
        format!(
            "showing {shown} of {} from #{} (more available)",
            section.total,
            section.window_start + 1
        )
    } else {
        format!("showing {shown} of {}", section.total)
    };
    out.push_str(&format!("  {}", style(window).dim()));
    out
}

fn format_product(product: &Product) -> String {
    let mut line = format!("{} ({})", product.name, product.id);
    if let Some(price) = product.price {
        line.push_str(&format!("  {}", format_price(price, product.original_price)));
    }
    if let Some(rating) = product.rating {
        line.push_str(&format!("  ★ {rating:.1}"));
        if let Some(reviews) = product.review_count {
            line.push_str(&format!(" ({reviews})"));
        }
    }
    line
}

fn format_price(price: f64, original: Option<f64>) -> String {
    match original {
        Some(original) if original > price => format!("{price:.2} (was {original:.2})"),
        _ => format!("{price:.2}"),
    }
}
