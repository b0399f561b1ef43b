//! 表格
//!
//! 三个相互独立的能力：表头点击排序（不排序 → 降序 → 升序 → 不排序），
//! 新行淡入上移动画（按批次序号错开），以及通过观察列表的增量行更新。

use super::observed_list::{ObservedList, RowFactory, RowHook, RowOrigin};
use crate::animation::{Easing, FrameScheduler, StyleAnimation};
use crate::binding::{keypath, BindableControl, ControlValue, DataBindHandler};
use crate::config::UiConfig;
use crate::context::UiContext;
use crate::dom::{Dom, NodeId};
use crate::event::{listener, EventKind};
use serde_json::Value as JsonValue;
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::Rc;

/// 新行上移的起始偏移
const ROW_SLIDE_OFFSET: f64 = 12.0;

type CellRenderer = Rc<dyn Fn(&JsonValue) -> String>;
type RowTapHandler = Rc<dyn Fn(usize, &JsonValue)>;

/// 列定义
#[derive(Clone)]
pub struct Column {
    pub key: String,
    pub title: String,
    pub sortable: bool,
    render: Option<CellRenderer>,
}

impl Column {
    pub fn new(key: &str, title: &str) -> Self {
        Self { key: key.to_string(), title: title.to_string(), sortable: false, render: None }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// 自定义单元格文本
    pub fn render<F>(mut self, f: F) -> Self
    where
        F: Fn(&JsonValue) -> String + 'static,
    {
        self.render = Some(Rc::new(f));
        self
    }

    fn cell_text(&self, record: &JsonValue) -> String {
        let value = keypath::resolve(record, &self.key);
        match &self.render {
            Some(render) => render(&value),
            None => keypath::display(&value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortState {
    Unsorted,
    Descending,
    Ascending,
}

impl SortState {
    fn next(self) -> Self {
        match self {
            SortState::Unsorted => SortState::Descending,
            SortState::Descending => SortState::Ascending,
            SortState::Ascending => SortState::Unsorted,
        }
    }
}

fn compare_present(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        _ => keypath::display(a).cmp(&keypath::display(b)),
    }
}

/// 按 key 稳定排序；null 无论方向都排在最后
pub fn sort_rows(rows: &mut [JsonValue], key: &str, descending: bool) {
    rows.sort_by(|a, b| {
        let va = keypath::resolve(a, key);
        let vb = keypath::resolve(b, key);
        match (va.is_null(), vb.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = compare_present(&va, &vb);
                if descending { ord.reverse() } else { ord }
            }
        }
    });
}

struct TableInner {
    node: NodeId,
    header_cells: Vec<NodeId>,
    body: NodeId,
    columns: Vec<Column>,
    list: RefCell<Option<ObservedList>>,
    sort: Cell<(usize, SortState)>,
    /// 进入排序前的插入顺序
    original: RefCell<Option<Vec<JsonValue>>>,
    animate_rows: Cell<bool>,
    on_row_tap: RefCell<Option<RowTapHandler>>,
    frames: FrameScheduler,
    config: Rc<UiConfig>,
}

#[derive(Clone)]
pub struct Table {
    inner: Rc<TableInner>,
}

impl Table {
    pub fn new(ctx: &UiContext, columns: Vec<Column>) -> Self {
        let dom = &ctx.dom;
        let node = dom.create_element("table");
        dom.add_class(node, "table");
        let head = dom.create_element("thead");
        let head_row = dom.create_element("tr");
        let body = dom.create_element("tbody");
        let mut header_cells = Vec::with_capacity(columns.len());
        for column in &columns {
            let th = dom.create_element("th");
            dom.set_text(th, &column.title);
            dom.set_attr(th, "data-key", &column.key);
            if column.sortable {
                dom.add_class(th, "sortable");
            }
            let _ = dom.append_child(head_row, th);
            header_cells.push(th);
        }
        let _ = dom.append_child(head, head_row);
        for child in [head, body] {
            let _ = dom.append_child(node, child);
        }

        let table = Self {
            inner: Rc::new(TableInner {
                node,
                header_cells,
                body,
                columns,
                list: RefCell::new(None),
                sort: Cell::new((0, SortState::Unsorted)),
                original: RefCell::new(None),
                animate_rows: Cell::new(false),
                on_row_tap: RefCell::new(None),
                frames: ctx.frames.clone(),
                config: ctx.config.clone(),
            }),
        };
        for (index, th) in table.inner.header_cells.iter().enumerate() {
            if !table.inner.columns[index].sortable {
                continue;
            }
            let this = table.clone();
            dom.add_listener(
                *th,
                EventKind::Tap,
                listener(move |ev| {
                    ev.stop_propagation();
                    this.cycle_sort(ev.dom, index);
                }),
            );
        }
        dom.set_control(node, Rc::new(table.clone()));
        table
    }

    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    /// 行容器
    pub fn body(&self) -> NodeId {
        self.inner.body
    }

    pub fn header_cell(&self, column: usize) -> Option<NodeId> {
        self.inner.header_cells.get(column).copied()
    }

    pub fn list(&self) -> Option<ObservedList> {
        self.inner.list.borrow().clone()
    }

    pub fn sort_state(&self) -> (usize, SortState) {
        self.inner.sort.get()
    }

    /// 开启新行动画，对之后渲染的行生效
    pub fn set_animate_rows(&self, animate: bool) {
        self.inner.animate_rows.set(animate);
        if let Some(list) = self.list() {
            list.set_row_hook(self.row_hook());
        }
    }

    pub fn on_row_tap<F>(&self, f: F)
    where
        F: Fn(usize, &JsonValue) + 'static,
    {
        *self.inner.on_row_tap.borrow_mut() = Some(Rc::new(f));
    }

    /// 不经绑定直接显示一组记录
    pub fn set_rows(&self, dom: &Dom, rows: Vec<JsonValue>) -> ObservedList {
        let list = ObservedList::from_items(rows);
        self.attach_list(dom, list.clone());
        list
    }

    fn attach_list(&self, dom: &Dom, list: ObservedList) {
        let same = self.list().map(|l| l.ptr_eq(&list)).unwrap_or(false);
        if !same {
            self.inner.sort.set((0, SortState::Unsorted));
            *self.inner.original.borrow_mut() = None;
            self.redraw_header(dom);
        }
        *self.inner.list.borrow_mut() = Some(list.clone());
        // 重复绑定同一列表时保留现有行及其高亮状态
        if same && list.is_rendered_in(self.inner.body) {
            list.set_row_hook(self.row_hook());
            return;
        }
        list.attach(dom, self.inner.body, self.row_factory(), self.row_hook());
    }

    fn row_factory(&self) -> RowFactory {
        // 列表由表格持有，工厂只保留弱引用
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move |dom: &Dom, record: &JsonValue, _index: usize| {
            let this = Table { inner: weak.upgrade()? };
            let row = dom.create_element("tr");
            dom.add_class(row, "table-row");
            for column in &this.inner.columns {
                let td = dom.create_element("td");
                dom.set_text(td, &column.cell_text(record));
                dom.append_child(row, td).ok()?;
            }
            dom.add_listener(row, EventKind::Tap, listener(move |ev| this.tap_row(ev.dom, ev.current)));
            Some(row)
        })
    }

    fn row_hook(&self) -> Option<RowHook> {
        if !self.inner.animate_rows.get() {
            return None;
        }
        let frames = self.inner.frames.clone();
        let config = self.inner.config.clone();
        Some(Rc::new(move |dom: &Dom, row: NodeId, origin: RowOrigin, batch_index: usize| {
            // 排序后的重建不算新行
            if origin == RowOrigin::Rebuilt {
                return;
            }
            let delay = config.animation.row_stagger_ms * batch_index as f64;
            let duration = config.animation.row_fade_ms;
            dom.set_style(row, "position", "relative");
            dom.set_style(row, "opacity", "0");
            dom.set_style(row, "top", &format!("{}px", ROW_SLIDE_OFFSET));
            StyleAnimation::new(row, "opacity", 1.0)
                .begin(0.0)
                .duration(duration)
                .easing(Easing::EaseOut)
                .start(dom, &frames, Some(delay));
            StyleAnimation::new(row, "top", 0.0)
                .begin(ROW_SLIDE_OFFSET)
                .duration(duration)
                .easing(Easing::EaseOut)
                .start(dom, &frames, Some(delay));
        }))
    }

    fn tap_row(&self, dom: &Dom, row: NodeId) {
        let Some(index) = dom.children(self.inner.body).iter().position(|r| *r == row) else { return };
        let highlighted = dom.toggle_class(row, "highlighted");
        tracing::debug!(index, highlighted, "row tapped");
        let record = self.list().and_then(|l| l.get(index)).unwrap_or(JsonValue::Null);
        let handler = self.inner.on_row_tap.borrow().clone();
        if let Some(handler) = handler {
            handler(index, &record);
        }
    }

    /// 表头点击：切换到下一个排序状态并原地重排底层数组
    pub fn cycle_sort(&self, dom: &Dom, column: usize) {
        let Some(col) = self.inner.columns.get(column) else { return };
        let Some(list) = self.list() else { return };
        let (current_column, state) = self.inner.sort.get();
        let next = if current_column == column { state.next() } else { SortState::Descending };

        if next == SortState::Unsorted {
            let restored = self.inner.original.borrow_mut().take();
            if let Some(original) = restored {
                list.with_array(|rows| *rows = restore_order(original, rows));
            }
        } else {
            if self.inner.original.borrow().is_none() {
                *self.inner.original.borrow_mut() = Some(list.to_vec());
            }
            let key = col.key.clone();
            list.with_array(|rows| sort_rows(rows, &key, next == SortState::Descending));
        }
        self.inner.sort.set((column, next));
        self.redraw_header(dom);
        list.rebuild();
        tracing::debug!(column, ?next, "table sorted");
    }

    fn redraw_header(&self, dom: &Dom) {
        let (sorted_column, state) = self.inner.sort.get();
        for (index, th) in self.inner.header_cells.iter().enumerate() {
            dom.remove_class(*th, "sort-asc");
            dom.remove_class(*th, "sort-desc");
            dom.remove_attr(*th, "aria-sort");
            if index != sorted_column {
                continue;
            }
            match state {
                SortState::Ascending => {
                    dom.add_class(*th, "sort-asc");
                    dom.set_attr(*th, "aria-sort", "ascending");
                }
                SortState::Descending => {
                    dom.add_class(*th, "sort-desc");
                    dom.set_attr(*th, "aria-sort", "descending");
                }
                SortState::Unsorted => {}
            }
        }
    }
}

/// 恢复插入顺序：排序期间新增的记录接在末尾，已删除的记录丢弃
fn restore_order(original: Vec<JsonValue>, current: &[JsonValue]) -> Vec<JsonValue> {
    let mut remaining: Vec<Option<&JsonValue>> = current.iter().map(Some).collect();
    let mut restored = Vec::with_capacity(current.len());
    for record in original {
        if let Some(slot) = remaining.iter_mut().find(|slot| slot.map(|r| *r == record).unwrap_or(false)) {
            *slot = None;
            restored.push(record);
        }
    }
    restored.extend(remaining.into_iter().flatten().cloned());
    restored
}

impl BindableControl for Table {
    fn get_value(&self, _dom: &Dom) -> ControlValue {
        ControlValue::Rows(self.list().unwrap_or_else(|| ObservedList::from_items(Vec::new())))
    }

    fn set_value(&self, dom: &Dom, value: ControlValue) {
        if let ControlValue::Rows(list) = value {
            self.attach_list(dom, list);
        }
    }

    /// 行数据通过观察列表直接写入，不需要写回钩子
    fn on_change(&self, _dom: &Dom, _handler: DataBindHandler) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_restore_order_keeps_additions() {
        let original = vec![json!(3), json!(1), json!(2)];
        let current = vec![json!(1), json!(2), json!(4), json!(3)];
        assert_eq!(restore_order(original, &current), vec![json!(3), json!(1), json!(2), json!(4)]);
        let shrunk = vec![json!(2)];
        assert_eq!(restore_order(vec![json!(1), json!(2)], &shrunk), vec![json!(2)]);
    }
}
