//! Каскадный выбор категории поста.

use crate::category::{Category, CategoryNode, CategoryTree};
use crate::error::DomainError;

/// Каскадный выбор категории: родитель, затем необязательная подкатегория.
///
/// Смена родителя всегда сбрасывает выбранную подкатегорию. Итоговая
/// категория поста: подкатегория, если выбрана, иначе родитель.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelector {
    tree: CategoryTree,
    parent: Option<String>,
    child: Option<String>,
}

impl CategorySelector {
    /// Создаёт селектор без выбранных значений.
    pub fn new(tree: CategoryTree) -> Self {
        Self {
            tree,
            parent: None,
            child: None,
        }
    }

    /// Подменяет дерево после повторной загрузки категорий.
    ///
    /// Выбор сохраняется, если категории всё ещё на месте и связаны так же;
    /// иначе сбрасывается.
    pub fn refresh(&mut self, tree: CategoryTree) {
        self.tree = tree;

        let parent_vanished = self
            .parent
            .as_deref()
            .is_some_and(|parent| self.tree.root(parent).is_none());
        if parent_vanished {
            self.parent = None;
            self.child = None;
            return;
        }

        let child_still_valid = match (self.parent.as_deref(), self.child.as_deref()) {
            (Some(parent), Some(child)) => {
                self.tree.children_of(parent).iter().any(|c| c.id == child)
            }
            _ => true,
        };
        if !child_still_valid {
            self.child = None;
        }
    }

    /// Текущее дерево.
    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    /// Варианты для первого списка.
    pub fn parent_options(&self) -> &[CategoryNode] {
        self.tree.roots()
    }

    /// Варианты для второго списка: дети выбранного родителя.
    pub fn child_options(&self) -> &[Category] {
        self.parent
            .as_deref()
            .map(|parent| self.tree.children_of(parent))
            .unwrap_or(&[])
    }

    /// Выбранный родитель.
    pub fn selected_parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Выбранная подкатегория.
    pub fn selected_child(&self) -> Option<&str> {
        self.child.as_deref()
    }

    /// Выбирает родителя (или снимает выбор) и сбрасывает подкатегорию.
    pub fn select_parent(&mut self, parent_id: Option<&str>) -> Result<(), DomainError> {
        if let Some(parent_id) = parent_id {
            if self.tree.root(parent_id).is_none() {
                return Err(DomainError::NotFound(format!("category id: {parent_id}")));
            }
        }

        self.parent = parent_id.map(str::to_string);
        self.child = None;
        Ok(())
    }

    /// Выбирает подкатегорию текущего родителя (или снимает выбор).
    pub fn select_child(&mut self, child_id: Option<&str>) -> Result<(), DomainError> {
        let Some(child_id) = child_id else {
            self.child = None;
            return Ok(());
        };

        let belongs = self.child_options().iter().any(|child| child.id == child_id);
        if !belongs {
            return Err(DomainError::Validation {
                field: "category",
                message: "subcategory does not belong to the selected parent",
            });
        }

        self.child = Some(child_id.to_string());
        Ok(())
    }

    /// Выставляет селектор на уже сохранённую категорию поста.
    ///
    /// Неизвестная категория сбрасывает выбор.
    pub fn preselect(&mut self, category_id: Option<&str>) {
        self.parent = None;
        self.child = None;

        let Some(category_id) = category_id else {
            return;
        };

        if self.tree.root(category_id).is_some() {
            self.parent = Some(category_id.to_string());
        } else if let Some(parent) = self.tree.parent_of(category_id) {
            self.parent = Some(parent.id.clone());
            self.child = Some(category_id.to_string());
        }
    }

    /// Снимает весь выбор.
    pub fn clear(&mut self) {
        self.parent = None;
        self.child = None;
    }

    /// Категория, которая уйдёт в пост при сохранении.
    pub fn effective_category(&self) -> Option<&str> {
        self.child.as_deref().or(self.parent.as_deref())
    }

    /// Идентификаторы для фильтра списка постов.
    pub fn filter_ids(&self) -> Vec<String> {
        match (self.child.as_deref(), self.parent.as_deref()) {
            (Some(child), _) => vec![child.to_string()],
            (None, Some(parent)) => self.tree.filter_ids(parent),
            (None, None) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: &str, parent: Option<&str>) -> Category {
        Category {
            id: id.to_string(),
            name: id.to_uppercase(),
            slug: id.to_string(),
            parent_id: parent.map(str::to_string),
            description: String::new(),
            keywords: String::new(),
        }
    }

    fn selector() -> CategorySelector {
        let categories = vec![
            cat("news", None),
            cat("world", Some("news")),
            cat("local", Some("news")),
            cat("tech", None),
            cat("phones", Some("tech")),
        ];
        CategorySelector::new(CategoryTree::build(&categories))
    }

    #[test]
    fn effective_category_prefers_child() {
        let mut s = selector();
        assert_eq!(s.effective_category(), None);

        s.select_parent(Some("news")).expect("parent exists");
        assert_eq!(s.effective_category(), Some("news"));

        s.select_child(Some("world")).expect("child exists");
        assert_eq!(s.effective_category(), Some("world"));
    }

    #[test]
    fn changing_parent_clears_child() {
        let mut s = selector();
        s.select_parent(Some("news")).expect("parent exists");
        s.select_child(Some("local")).expect("child exists");

        s.select_parent(Some("tech")).expect("parent exists");
        assert_eq!(s.selected_child(), None);
        assert_eq!(s.effective_category(), Some("tech"));
        assert_eq!(s.child_options().len(), 1);
    }

    #[test]
    fn child_of_other_parent_is_rejected() {
        let mut s = selector();
        s.select_parent(Some("news")).expect("parent exists");
        let err = s.select_child(Some("phones")).expect_err("must be rejected");
        assert!(matches!(err, DomainError::Validation { field: "category", .. }));
        assert_eq!(s.selected_child(), None);
    }

    #[test]
    fn child_without_parent_is_rejected() {
        let mut s = selector();
        assert!(s.select_child(Some("world")).is_err());
    }

    #[test]
    fn unknown_parent_is_not_found() {
        let mut s = selector();
        assert!(matches!(
            s.select_parent(Some("phones")),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn preselect_positions_on_child_and_root() {
        let mut s = selector();
        s.preselect(Some("phones"));
        assert_eq!(s.selected_parent(), Some("tech"));
        assert_eq!(s.selected_child(), Some("phones"));

        s.preselect(Some("news"));
        assert_eq!(s.selected_parent(), Some("news"));
        assert_eq!(s.selected_child(), None);

        s.preselect(Some("missing"));
        assert_eq!(s.effective_category(), None);
    }

    #[test]
    fn refresh_drops_vanished_selection() {
        let mut s = selector();
        s.select_parent(Some("news")).expect("parent exists");
        s.select_child(Some("world")).expect("child exists");

        let categories = vec![cat("news", None), cat("local", Some("news"))];
        s.refresh(CategoryTree::build(&categories));
        assert_eq!(s.selected_parent(), Some("news"));
        assert_eq!(s.selected_child(), None);

        s.refresh(CategoryTree::build(&[cat("tech", None)]));
        assert_eq!(s.selected_parent(), None);
    }

    #[test]
    fn filter_ids_expand_parent_selection() {
        let mut s = selector();
        s.select_parent(Some("news")).expect("parent exists");
        assert_eq!(s.filter_ids(), vec!["news", "world", "local"]);

        s.select_child(Some("local")).expect("child exists");
        assert_eq!(s.filter_ids(), vec!["local"]);
    }
}
