use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};
use storefront_engine::{
    db_types::{
        AuditEntry,
        CategoryStats,
        MaintenanceReport,
        Product,
        SalesStatistics,
        SchemaObject,
        TableDocumentation,
        TopCustomer,
        User,
        UserOrderSummary,
    },
    OrderDetails,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_table() -> Table {
    let mut table = Table::new();
    table.set_format(markdown_format());
    table
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn format_users(users: &[User]) -> String {
    if users.is_empty() {
        return "No users".to_string();
    }
    let mut table = markdown_table();
    table.set_titles(row!["ID", "Username", "Email", "Status", "Created At"]);
    for user in users {
        table.add_row(row![user.id, user.username, user.email, user.status, user.created_at.to_rfc2822()]);
    }
    table.to_string()
}

pub fn format_products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products".to_string();
    }
    let mut table = markdown_table();
    table.set_titles(row!["ID", "Name", "Category", "Price", "Stock"]);
    for p in products {
        table.add_row(row![p.id, p.name, p.category, r->p.price, r->p.stock]);
    }
    table.to_string()
}

pub fn format_category_stats(stats: &[CategoryStats]) -> String {
    if stats.is_empty() {
        return "No products".to_string();
    }
    let mut table = markdown_table();
    table.set_titles(row!["Category", "Products", "Avg price", "Min price", "Max price", "Total stock"]);
    for s in stats {
        table.add_row(row![
            s.category,
            r->s.product_count,
            r->s.avg_price,
            r->s.min_price,
            r->s.max_price,
            r->s.total_stock
        ]);
    }
    table.to_string()
}

pub fn format_sales_statistics(stats: &SalesStatistics) -> String {
    let mut table = markdown_table();
    table.set_titles(row!["Metric", "Value"]);
    table.add_row(row!["Total orders", r->stats.total_orders]);
    table.add_row(row!["Unique customers", r->stats.unique_customers]);
    table.add_row(row!["Total revenue", r->stats.total_revenue]);
    table.add_row(row!["Average order", r->stats.avg_order_value]);
    table.add_row(row!["Smallest order", r->stats.min_order]);
    table.add_row(row!["Largest order", r->stats.max_order]);
    table.add_row(row!["Completed", r->stats.completed_orders]);
    table.add_row(row!["Pending", r->stats.pending_orders]);
    table.add_row(row!["Cancelled", r->stats.cancelled_orders]);
    table.to_string()
}

pub fn format_user_summary(summary: &UserOrderSummary) -> String {
    let mut table = markdown_table();
    table.set_titles(row!["User", "Email", "Orders", "Total spent", "Average", "Last order", "Products"]);
    table.add_row(row![
        format!("{} ({})", summary.username, summary.id),
        summary.email,
        r->summary.order_count,
        r->summary.total_spent,
        r->summary.avg_order_value,
        or_dash(summary.last_order_date.map(|d| d.to_rfc2822())),
        r->summary.unique_products_purchased
    ]);
    table.to_string()
}

pub fn format_top_customers(customers: &[TopCustomer]) -> String {
    if customers.is_empty() {
        return "No completed orders yet".to_string();
    }
    let mut table = markdown_table();
    table.set_titles(row!["Rank", "ID", "Username", "Email", "Orders", "Total spent"]);
    for (i, c) in customers.iter().enumerate() {
        table.add_row(row![r->i + 1, c.id, c.username, c.email, r->c.order_count, r->c.total_spent]);
    }
    table.to_string()
}

pub fn format_audit_log(entries: &[AuditEntry]) -> String {
    if entries.is_empty() {
        return "The audit log is empty".to_string();
    }
    let mut table = markdown_table();
    table.set_titles(row!["ID", "Table", "Action", "User", "Timestamp", "Details"]);
    for e in entries {
        table.add_row(row![
            e.id,
            e.table_name,
            e.action,
            or_dash(e.user_id),
            e.timestamp.to_rfc2822(),
            or_dash(e.details.as_deref())
        ]);
    }
    table.to_string()
}

pub fn format_schema(objects: &[SchemaObject]) -> String {
    let mut table = markdown_table();
    table.set_titles(row!["Type", "Name", "Table"]);
    for o in objects {
        table.add_row(row![o.kind, o.name, o.table_name]);
    }
    table.to_string()
}

pub fn format_table_docs(tables: &[TableDocumentation]) -> String {
    let mut table = markdown_table();
    table.set_titles(row!["Table", "Rows", "Column", "Type", "Not null", "Default", "PK"]);
    for t in tables {
        for (i, c) in t.columns.iter().enumerate() {
            let (name, rows) = if i == 0 { (t.name.clone(), t.row_count.to_string()) } else { Default::default() };
            let pk = if c.is_primary_key() { "✓" } else { "" };
            let not_null = if c.not_null { "✓" } else { "" };
            table.add_row(row![name, r->rows, c.name, c.data_type, not_null, or_dash(c.default_value.as_deref()), pk]);
        }
    }
    table.to_string()
}

pub fn format_maintenance(report: &MaintenanceReport) -> String {
    let plan = report.query_plan.iter().map(|step| format!("  {step}")).collect::<Vec<_>>().join("\n");
    format!(
        "ANALYZE and VACUUM complete. Pages: {} -> {}\nQuery plan for the order count per user:\n{plan}",
        report.page_count_before, report.page_count_after
    )
}

pub fn format_order_details(details: &OrderDetails) -> String {
    let order = &details.order;
    let mut table = markdown_table();
    table.set_titles(row!["Product", "Quantity", "Unit price", "Line total"]);
    for item in &details.items {
        table.add_row(row![item.product_id, r->item.quantity, r->item.price, r->item.line_total()]);
    }
    table.add_row(row!["Total", "", "", r->order.total_amount]);
    format!(
        "Order {} for user {} ({}) placed {}\n{table}",
        order.id,
        order.user_id,
        order.status,
        order.order_date.to_rfc2822()
    )
}
