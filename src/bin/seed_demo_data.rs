use chrono::Local;
use std::error::Error;
use std::fs;
use std::path::Path;

use order_manager::app::get_default_db_path;
use order_manager::db::open_shared_connection;
use order_manager::domain::{FreightType, SimplifiedOrder, Size};
use order_manager::repository::{GroupRepository, OrderRepository};

const DEMO_TRACKING_CODE: &str = "BR000000001";

const DEMO_ORDERS: [(&str, &str, &str, Size, FreightType); 15] = [
    ("PED001", "João Silva", "Brasil 2024", Size::M, FreightType::Standard),
    ("PED002", "Maria Santos", "Real Madrid", Size::G, FreightType::Standard),
    ("PED003", "Pedro Costa", "Barcelona", Size::P, FreightType::Standard),
    ("PED004", "Ana Oliveira", "Brasil 2024", Size::GG, FreightType::Standard),
    ("PED005", "Carlos Lima", "Manchester United", Size::M, FreightType::Standard),
    ("PED006", "Lucia Ferreira", "Brasil 2024", Size::G, FreightType::Standard),
    ("PED007", "Roberto Alves", "Bayern Munich", Size::P, FreightType::Standard),
    ("PED008", "Fernanda Rocha", "Real Madrid", Size::M, FreightType::Standard),
    ("PED009", "Diego Souza", "Barcelona", Size::GG, FreightType::Standard),
    ("PED010", "Camila Torres", "Brasil 2024", Size::P, FreightType::Standard),
    ("PED011", "Ricardo Mendes", "Brasil 2024", Size::M, FreightType::Express),
    ("PED012", "Juliana Costa", "Real Madrid", Size::G, FreightType::Express),
    ("PED013", "Marcelo Silva", "Barcelona", Size::P, FreightType::Express),
    ("PED014", "Patricia Lima", "Manchester United", Size::GG, FreightType::Express),
    ("PED015", "Thiago Santos", "Bayern Munich", Size::M, FreightType::Express),
];

/// (分组名称, 成员订单号)
const DEMO_GROUPS: [(&str, &[&str]); 3] = [
    ("Grupo 1", &["PED001", "PED002", "PED003"]),
    ("Grupo 2", &["PED004", "PED005"]),
    ("Grupo 3", &["PED006"]),
];

fn main() -> Result<(), Box<dyn Error>> {
    order_manager::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let conn = open_shared_connection(&db_path)?;
    let orders = OrderRepository::from_connection(conn.clone());
    let groups = GroupRepository::from_connection(conn);

    for (order_id, customer, product, size, freight_type) in DEMO_ORDERS {
        orders.insert(&SimplifiedOrder::new(
            order_id.to_string(),
            customer.to_string(),
            product.to_string(),
            size,
            freight_type,
        ))?;
    }

    let mut group_ids = Vec::with_capacity(DEMO_GROUPS.len());
    for (name, members) in DEMO_GROUPS {
        let group_id = groups.create(name)?;
        let members: Vec<String> = members.iter().map(|m| m.to_string()).collect();
        groups.assign_orders(group_id, &members, order_manager::MAX_GROUP_SIZE)?;
        group_ids.push(group_id);
    }

    // Grupo 1 已发货
    if let Some(first) = group_ids.first() {
        groups.mark_shipped(*first, DEMO_TRACKING_CODE)?;
    }

    let (total, grouped) = orders.count_totals()?;
    let (group_total, shipped) = groups.count_totals()?;
    tracing::info!(
        db_path = %db_path,
        orders = total,
        grouped,
        groups = group_total,
        shipped,
        "演示数据已写入"
    );
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}
