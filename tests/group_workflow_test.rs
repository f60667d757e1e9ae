// ==========================================
// 发货分组 + 导出 集成测试
// ==========================================
// 测试目标: 导入 → 分组 → 发货 → 导出 全流程
// 红线: 分组至多 5 单；EXPRESS 订单不可分组
// ==========================================


use order_manager::api::{build_export_rows, ApiError, EXPORT_HEADERS};
use order_manager::domain::{FreightType, OrderDraft, Size};
use order_manager::logging;
use test_helpers::{create_test_state, english_csv, sample_lines, CsvLine};

fn draft(order_id: &str, freight_type: FreightType) -> OrderDraft {
    OrderDraft {
        order_id: order_id.to_string(),
        customer_name: format!("Cliente {}", order_id),
        product_name: "Camiseta Brasil G".to_string(),
        size: Size::G,
        freight_type,
    }
}

#[test]
fn test_group_capacity_is_enforced() {
    logging::init_test();
    let (_temp_file, state) = create_test_state();

    for i in 1..=6 {
        state
            .order_api
            .create_order(&draft(&format!("PED{:03}", i), FreightType::Standard))
            .unwrap();
    }
    let group = state.group_api.create_group("Grupo 1").unwrap();

    for i in 1..=5 {
        state
            .group_api
            .add_order(group.group_id, &format!("PED{:03}", i))
            .unwrap();
    }

    let err = state.group_api.add_order(group.group_id, "PED006").unwrap_err();
    assert!(matches!(err, ApiError::GroupFull { capacity: 5, .. }));

    // 第 6 单仍未分组
    let sixth = state.order_api.get_order("PED006").unwrap();
    assert_eq!(sixth.order.group_id, None);
    assert_eq!(state.group_api.list_group_orders(group.group_id).unwrap().len(), 5);
    assert!(state.group_api.list_groups_with_room().unwrap().is_empty());
}

#[test]
fn test_express_order_cannot_join_group() {
    logging::init_test();
    let (_temp_file, state) = create_test_state();

    state
        .order_api
        .create_order(&draft("PED011", FreightType::Express))
        .unwrap();
    let group = state.group_api.create_group("Grupo 1").unwrap();

    let err = state.group_api.add_order(group.group_id, "PED011").unwrap_err();
    assert!(matches!(err, ApiError::FreightNotGroupable { ref order_id } if order_id == "PED011"));

    let available = state.order_api.list_available().unwrap();
    assert!(available.standard.is_empty());
    assert_eq!(available.express.len(), 1);
}

#[test]
fn test_batch_move_rejected_as_a_whole() {
    logging::init_test();
    let (_temp_file, state) = create_test_state();

    let ids: Vec<String> = (1..=4).map(|i| format!("PED{:03}", i)).collect();
    for id in &ids {
        state
            .order_api
            .create_order(&draft(id, FreightType::Standard))
            .unwrap();
    }
    let group = state.group_api.create_group("Grupo 1").unwrap();
    state
        .group_api
        .move_orders(group.group_id, &ids[..2])
        .unwrap();

    // 2 + 4 > 5
    let err = state.group_api.move_orders(group.group_id, &ids).unwrap_err();
    assert!(matches!(err, ApiError::GroupFull { .. }));
    assert_eq!(state.group_api.list_group_orders(group.group_id).unwrap().len(), 2);

    // 2 + 2 <= 5
    let moved = state
        .group_api
        .move_orders(group.group_id, &ids[2..])
        .unwrap();
    assert_eq!(moved.moved, ids[2..].to_vec());
}

#[tokio::test]
async fn test_import_group_ship_and_export() {
    logging::init_test();
    let (_temp_file, state) = create_test_state();

    let mut lines = sample_lines();
    lines.push(CsvLine::new("1003", "Carlos Lima", "PAC", "Camisa Retrô XG"));
    let csv = english_csv(',', &lines);
    let response = state
        .import_api
        .import_upload(Some("orders.csv"), csv.as_bytes())
        .await
        .unwrap();
    assert_eq!(response.summary.imported, 4);

    // 只有 STANDARD 订单可分组
    let groupable: Vec<String> = state
        .order_api
        .list_groupable()
        .unwrap()
        .into_iter()
        .map(|o| o.order_id)
        .collect();
    assert_eq!(groupable.len(), 2);
    assert!(groupable.contains(&"1002".to_string()));
    assert!(groupable.contains(&"1003".to_string()));

    let group = state.group_api.create_group("Grupo SP").unwrap();
    let moved = state
        .group_api
        .move_orders(group.group_id, &groupable)
        .unwrap();
    assert_eq!(moved.moved.len(), 2);

    state
        .group_api
        .mark_shipped(group.group_id, " BR123456789 ")
        .unwrap();
    let groups = state.group_api.list_groups().unwrap();
    assert!(groups[0].group.shipped);
    assert_eq!(groups[0].group.tracking_code.as_deref(), Some("BR123456789"));

    let totals = state.dashboard_api.get_totals().unwrap();
    assert_eq!(totals.total_orders, 4);
    assert_eq!(totals.grouped_orders, 2);
    assert_eq!(totals.ungrouped_orders, 2);
    assert_eq!(totals.shipped_groups, 1);

    // 导出: 先 GROUP 行，后 EXPRESS 行
    let orders = state.order_api.list_orders().unwrap();
    let rows = build_export_rows(&orders);
    let types: Vec<&str> = rows.iter().map(|r| r.row_type.as_str()).collect();
    assert_eq!(types, vec!["GROUP", "GROUP", "EXPRESS", "EXPRESS"]);
    assert!(rows[..2].iter().all(|r| r.group == "Grupo SP" && r.shipped == "YES"));
    assert!(rows[2..].iter().all(|r| r.group.is_empty() && r.shipped == "N/A"));

    let file = state.export_api.export_csv().unwrap();
    assert!(file.file_name.starts_with("orders_"));
    assert!(file.file_name.ends_with(".csv"));
    let text = String::from_utf8(file.content).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(EXPORT_HEADERS.join(",").as_str()));
    assert_eq!(lines.count(), 4);
}

#[test]
fn test_delete_group_keeps_orders() {
    logging::init_test();
    let (_temp_file, state) = create_test_state();

    state
        .order_api
        .create_order(&draft("PED001", FreightType::Standard))
        .unwrap();
    let group = state.group_api.create_group("Grupo 1").unwrap();
    state.group_api.add_order(group.group_id, "PED001").unwrap();

    state.group_api.delete_group(group.group_id).unwrap();

    let order = state.order_api.get_order("PED001").unwrap();
    assert_eq!(order.order.group_id, None);
    assert!(matches!(
        state.group_api.delete_group(group.group_id),
        Err(ApiError::NotFound(_))
    ));
}
