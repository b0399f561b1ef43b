//! 观察列表
//!
//! 包装数据对象里的一个数组，把追加和等长替换转换为增量的行插入与删除。
//! 每个变更方法返回前都保证 `len() == rendered_rows()`。

use crate::binding::keypath;
use crate::binding::DataObject;
use crate::dom::{Dom, NodeId, WeakDom};
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// 行工厂：(视觉树, 记录, 下标) -> 行节点
pub type RowFactory = Rc<dyn Fn(&Dom, &JsonValue, usize) -> Option<NodeId>>;

/// 行是如何产生的
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrigin {
    /// 首次挂载时的整表渲染
    Initial,
    Appended,
    /// 等长替换
    Replaced,
    /// 排序或整体替换后的重建
    Rebuilt,
}

/// 行插入后的钩子：(视觉树, 行节点, 来源, 本批次中的序号)
pub type RowHook = Rc<dyn Fn(&Dom, NodeId, RowOrigin, usize)>;

pub const PLACEHOLDER_CLASS: &str = "row-placeholder";

struct View {
    dom: WeakDom,
    container: NodeId,
    factory: RowFactory,
    hook: Option<RowHook>,
}

struct ListInner {
    source: DataObject,
    key_path: String,
    view: Option<View>,
}

/// 观察列表句柄，克隆共享同一份状态
#[derive(Clone)]
pub struct ObservedList {
    inner: Rc<RefCell<ListInner>>,
}

impl ObservedList {
    pub fn new(source: DataObject, key_path: &str) -> Self {
        let key_path = if keypath::is_whole(key_path) { keypath::WHOLE.to_string() } else { key_path.trim().to_string() };
        Self { inner: Rc::new(RefCell::new(ListInner { source, key_path, view: None })) }
    }

    /// 独立的列表，不属于任何调用方对象
    pub fn from_items(items: Vec<JsonValue>) -> Self {
        Self::new(DataObject::new(JsonValue::Array(items)), keypath::WHOLE)
    }

    pub fn source(&self) -> DataObject {
        self.inner.borrow().source.clone()
    }

    pub fn key_path(&self) -> String {
        self.inner.borrow().key_path.clone()
    }

    /// 是否已经包装了同一个数据对象的同一路径
    pub fn is_view_of(&self, data: &DataObject, key_path: &str) -> bool {
        let inner = self.inner.borrow();
        let same_path = if keypath::is_whole(key_path) {
            keypath::is_whole(&inner.key_path)
        } else {
            inner.key_path == key_path.trim()
        };
        same_path && inner.source.ptr_eq(data)
    }

    pub fn ptr_eq(&self, other: &ObservedList) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// 在底层数组上执行操作；路径指向 null 时初始化为空数组
    pub fn with_array<R>(&self, f: impl FnOnce(&mut Vec<JsonValue>) -> R) -> Option<R> {
        let (source, path) = {
            let inner = self.inner.borrow();
            (inner.source.clone(), inner.key_path.clone())
        };
        source.with_mut(|root| {
            let target = keypath::resolve_mut(root, &path)?;
            if target.is_null() {
                *target = JsonValue::Array(Vec::new());
            }
            target.as_array_mut().map(f)
        })
    }

    pub fn len(&self) -> usize {
        self.with_array(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<JsonValue> {
        self.with_array(|items| items.get(index).cloned()).flatten()
    }

    pub fn to_vec(&self) -> Vec<JsonValue> {
        self.with_array(|items| items.clone()).unwrap_or_default()
    }

    /// 挂载到容器并整表渲染，钩子在首批行渲染前就位
    pub fn attach(&self, dom: &Dom, container: NodeId, factory: RowFactory, hook: Option<RowHook>) {
        self.inner.borrow_mut().view = Some(View { dom: dom.downgrade(), container, factory, hook });
        self.render_all(RowOrigin::Initial);
    }

    /// 已挂载在该容器上且行数与数组一致
    pub fn is_rendered_in(&self, container: NodeId) -> bool {
        self.container() == Some(container) && self.rendered_rows() == self.len()
    }

    pub fn set_row_hook(&self, hook: Option<RowHook>) {
        if let Some(view) = self.inner.borrow_mut().view.as_mut() {
            view.hook = hook;
        }
    }

    pub fn container(&self) -> Option<NodeId> {
        self.inner.borrow().view.as_ref().map(|v| v.container)
    }

    /// 容器中已渲染的行数
    pub fn rendered_rows(&self) -> usize {
        match self.view() {
            Some((dom, container, _, _)) => dom.child_count(container),
            None => 0,
        }
    }

    /// 追加一条记录并只渲染这一行
    pub fn append(&self, item: JsonValue) {
        let Some(index) = self.with_array(|items| {
            items.push(item.clone());
            items.len() - 1
        }) else {
            return;
        };
        if let Some((dom, container, factory, hook)) = self.view() {
            let row = render_row(&dom, &factory, &item, index);
            if dom.append_child(container, row).is_ok() {
                if let Some(hook) = hook {
                    hook(&dom, row, RowOrigin::Appended, 0);
                }
            }
        }
        tracing::debug!(index, "row appended");
    }

    /// 从 start 起删除 delete_count 条并插入 items，返回被删除的记录。
    ///
    /// 等长替换只重绘受影响的行；长度变化时整表重建。
    pub fn splice_replace(&self, start: usize, delete_count: usize, items: Vec<JsonValue>) -> Vec<JsonValue> {
        let inserted = items.len();
        let spliced = self.with_array(|array| {
            let start = start.min(array.len());
            let delete_count = delete_count.min(array.len() - start);
            let removed: Vec<JsonValue> = array.splice(start..start + delete_count, items.clone()).collect();
            (start, removed)
        });
        let Some((start, removed)) = spliced else {
            return Vec::new();
        };
        let Some((dom, container, factory, hook)) = self.view() else {
            return removed;
        };

        if inserted != removed.len() {
            tracing::debug!(start, removed = removed.len(), inserted, "splice changed length, rebuilding rows");
            self.render_all(RowOrigin::Rebuilt);
            return removed;
        }

        let rows = dom.children(container);
        // 倒序删除，保持前面的下标不变
        for i in (start..start + removed.len()).rev() {
            if let Some(row) = rows.get(i) {
                dom.remove(*row);
            }
        }
        for (k, item) in items.iter().enumerate() {
            let row = render_row(&dom, &factory, item, start + k);
            if dom.insert_at(container, start + k, row).is_ok() {
                if let Some(hook) = hook.as_ref() {
                    hook(&dom, row, RowOrigin::Replaced, k);
                }
            }
        }
        tracing::debug!(start, count = inserted, "rows replaced");
        removed
    }

    /// 替换单条记录
    pub fn update(&self, index: usize, item: JsonValue) -> Option<JsonValue> {
        if index >= self.len() {
            return None;
        }
        self.splice_replace(index, 1, vec![item]).into_iter().next()
    }

    /// 整体替换底层数组
    pub fn replace_all(&self, items: Vec<JsonValue>) {
        self.with_array(|array| *array = items);
        self.render_all(RowOrigin::Rebuilt);
    }

    /// 按当前数组重建全部行
    pub fn rebuild(&self) {
        self.render_all(RowOrigin::Rebuilt);
    }

    fn view(&self) -> Option<(Dom, NodeId, RowFactory, Option<RowHook>)> {
        let inner = self.inner.borrow();
        let view = inner.view.as_ref()?;
        let dom = view.dom.upgrade()?;
        Some((dom, view.container, view.factory.clone(), view.hook.clone()))
    }

    fn render_all(&self, origin: RowOrigin) {
        let Some((dom, container, factory, hook)) = self.view() else { return };
        dom.clear_children(container);
        let items = self.to_vec();
        for (index, item) in items.iter().enumerate() {
            let row = render_row(&dom, &factory, item, index);
            if dom.append_child(container, row).is_ok() {
                if let Some(hook) = hook.as_ref() {
                    hook(&dom, row, origin, index);
                }
            }
        }
        tracing::debug!(rows = items.len(), ?origin, "rows rendered");
    }
}

/// 行工厂失败时渲染占位行，保证行数与记录数一致
fn render_row(dom: &Dom, factory: &RowFactory, item: &JsonValue, index: usize) -> NodeId {
    match factory(dom, item, index) {
        Some(row) => row,
        None => {
            tracing::warn!(index, "row factory produced no node, using placeholder");
            let row = dom.create_element("tr");
            dom.add_class(row, PLACEHOLDER_CLASS);
            row
        }
    }
}

impl fmt::Debug for ObservedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservedList")
            .field("key_path", &inner.key_path)
            .field("attached", &inner.view.is_some())
            .finish()
    }
}
