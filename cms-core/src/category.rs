//! Категории: модель, двухуровневое дерево для выпадающих списков,
//! плоский список с глубиной и проверка иерархии перед сохранением.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::DomainError;
use crate::slug;
use crate::wire;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Категория в том виде, в каком её отдаёт `list-categories`.
pub struct Category {
    /// Идентификатор категории.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Название.
    pub name: String,
    /// Slug категории.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub slug: String,
    /// Родительская категория; `None` у корневых.
    #[serde(
        rename = "parentCategory",
        default,
        deserialize_with = "wire::optional_id_ref"
    )]
    pub parent_id: Option<String>,
    /// Описание.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub description: String,
    /// Ключевые слова (строкой, как их хранит бэкенд).
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub keywords: String,
}

impl Category {
    /// Является ли категория корневой.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Корневая категория вместе с непосредственными подкатегориями.
pub struct CategoryNode {
    /// Корневая категория.
    pub category: Category,
    /// Подкатегории в порядке исходного списка.
    pub children: Vec<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Двухуровневое дерево категорий, построенное из плоского списка.
///
/// В дерево попадают только корни и их прямые дети. Категории с
/// отсутствующим родителем и категории третьего уровня отбрасываются молча.
pub struct CategoryTree {
    roots: Vec<CategoryNode>,
}

impl CategoryTree {
    /// Строит дерево, сохраняя порядок исходного списка.
    pub fn build(categories: &[Category]) -> Self {
        let roots = categories
            .iter()
            .filter(|category| category.is_root())
            .map(|root| CategoryNode {
                category: root.clone(),
                children: categories
                    .iter()
                    .filter(|category| category.parent_id.as_deref() == Some(root.id.as_str()))
                    .cloned()
                    .collect(),
            })
            .collect();

        Self { roots }
    }

    /// Корневые узлы.
    pub fn roots(&self) -> &[CategoryNode] {
        &self.roots
    }

    /// Корневой узел по id.
    pub fn root(&self, id: &str) -> Option<&CategoryNode> {
        self.roots.iter().find(|node| node.category.id == id)
    }

    /// Подкатегории корня; пустой срез, если такого корня нет.
    pub fn children_of(&self, parent_id: &str) -> &[Category] {
        self.root(parent_id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Корень, которому принадлежит подкатегория `child_id`.
    pub fn parent_of(&self, child_id: &str) -> Option<&Category> {
        self.roots
            .iter()
            .find(|node| node.children.iter().any(|child| child.id == child_id))
            .map(|node| &node.category)
    }

    /// Категория любого уровня дерева по id.
    pub fn find(&self, id: &str) -> Option<&Category> {
        self.roots.iter().find_map(|node| {
            if node.category.id == id {
                Some(&node.category)
            } else {
                node.children.iter().find(|child| child.id == id)
            }
        })
    }

    /// Есть ли категория в дереве.
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Идентификаторы для фильтра «категория и все её подкатегории».
    ///
    /// Для подкатегории возвращается только она сама.
    pub fn filter_ids(&self, id: &str) -> Vec<String> {
        match self.root(id) {
            Some(node) => std::iter::once(node.category.id.clone())
                .chain(node.children.iter().map(|child| child.id.clone()))
                .collect(),
            None if self.contains(id) => vec![id.to_string()],
            None => Vec::new(),
        }
    }

    /// Общее число категорий в дереве.
    pub fn len(&self) -> usize {
        self.roots.iter().map(|node| 1 + node.children.len()).sum()
    }

    /// Пустое ли дерево.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Категория с уровнем вложенности для плоского списка.
pub struct FlatCategory {
    /// Сама категория.
    pub category: Category,
    /// Глубина: 0 у корня.
    pub level: usize,
}

impl FlatCategory {
    /// Подпись для выпадающего списка с отступом по уровню.
    pub fn label(&self) -> String {
        format!("{}{}", "— ".repeat(self.level), self.category.name)
    }
}

/// Обход в глубину произвольной вложенности, начиная с корней.
///
/// Потомки идут сразу за родителем, братья в исходном порядке; сироты не
/// попадают в результат.
pub fn flatten_with_depth(categories: &[Category]) -> Vec<FlatCategory> {
    let mut out = Vec::with_capacity(categories.len());
    push_level(categories, None, 0, &mut out);
    out
}

fn push_level(
    categories: &[Category],
    parent_id: Option<&str>,
    level: usize,
    out: &mut Vec<FlatCategory>,
) {
    for category in categories
        .iter()
        .filter(|category| category.parent_id.as_deref() == parent_id)
    {
        out.push(FlatCategory {
            category: category.clone(),
            level,
        });
        push_level(categories, Some(category.id.as_str()), level + 1, out);
    }
}

/// Проверяет, что назначение родителя не выводит за два уровня.
///
/// `category_id` задан при редактировании существующей категории.
pub fn validate_parent(
    categories: &[Category],
    category_id: Option<&str>,
    parent_id: Option<&str>,
) -> Result<(), DomainError> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };

    if category_id == Some(parent_id) {
        return Err(DomainError::InvalidHierarchy(
            "category cannot be its own parent",
        ));
    }

    let parent = categories
        .iter()
        .find(|category| category.id == parent_id)
        .ok_or_else(|| DomainError::NotFound(format!("category id: {parent_id}")))?;

    if !parent.is_root() {
        return Err(DomainError::InvalidHierarchy(
            "parent must be a top-level category",
        ));
    }

    if let Some(category_id) = category_id {
        let has_children = categories
            .iter()
            .any(|category| category.parent_id.as_deref() == Some(category_id));
        if has_children {
            return Err(DomainError::InvalidHierarchy(
                "category with subcategories cannot become a subcategory",
            ));
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
/// Тело запроса на создание или изменение категории.
pub struct CategoryDraft {
    /// Название без лишних пробелов.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Родитель или `null` для корневой категории.
    #[serde(rename = "parentCategory")]
    pub parent_id: Option<String>,
    /// Итоговый slug.
    #[validate(length(min = 1, max = 200))]
    pub slug: String,
    /// Описание.
    pub description: String,
    /// Ключевые слова.
    pub keywords: String,
}

impl CategoryDraft {
    /// Собирает черновик из значений формы.
    ///
    /// Пробелы в названии схлопываются, slug берётся явный либо строится из
    /// названия (и названия родителя, если он есть).
    pub fn new(
        name: &str,
        explicit_slug: Option<&str>,
        parent: Option<&Category>,
        description: &str,
        keywords: &str,
    ) -> Self {
        let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        let slug = slug::category_slug(&name, explicit_slug, parent.map(|p| p.name.as_str()));

        Self {
            name,
            parent_id: parent.map(|p| p.id.clone()),
            slug,
            description: description.trim().to_string(),
            keywords: keywords.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: &str, name: &str, parent: Option<&str>) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            parent_id: parent.map(str::to_string),
            description: String::new(),
            keywords: String::new(),
        }
    }

    fn sample() -> Vec<Category> {
        vec![
            cat("news", "News", None),
            cat("phones", "Phones", Some("tech")),
            cat("tech", "Tech", None),
            cat("world", "World", Some("news")),
            cat("orphan", "Orphan", Some("missing")),
            cat("laptops", "Laptops", Some("tech")),
            cat("deep", "Deep", Some("phones")),
        ]
    }

    #[test]
    fn build_keeps_roots_and_direct_children_in_input_order() {
        let tree = CategoryTree::build(&sample());

        let roots: Vec<_> = tree.roots().iter().map(|n| n.category.id.as_str()).collect();
        assert_eq!(roots, vec!["news", "tech"]);

        let tech_children: Vec<_> = tree.children_of("tech").iter().map(|c| c.id.as_str()).collect();
        assert_eq!(tech_children, vec!["phones", "laptops"]);
        assert_eq!(tree.children_of("news").len(), 1);
    }

    #[test]
    fn build_drops_orphans_and_grandchildren() {
        let tree = CategoryTree::build(&sample());
        assert!(!tree.contains("orphan"));
        assert!(!tree.contains("deep"));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn children_of_unknown_parent_is_empty() {
        let tree = CategoryTree::build(&sample());
        assert!(tree.children_of("missing").is_empty());
        assert!(tree.children_of("phones").is_empty());
    }

    #[test]
    fn parent_of_finds_owning_root() {
        let tree = CategoryTree::build(&sample());
        assert_eq!(tree.parent_of("laptops").map(|c| c.id.as_str()), Some("tech"));
        assert!(tree.parent_of("tech").is_none());
    }

    #[test]
    fn filter_ids_expands_root_to_children() {
        let tree = CategoryTree::build(&sample());
        assert_eq!(tree.filter_ids("tech"), vec!["tech", "phones", "laptops"]);
        assert_eq!(tree.filter_ids("phones"), vec!["phones"]);
        assert!(tree.filter_ids("missing").is_empty());
    }

    #[test]
    fn flatten_walks_any_depth_and_skips_orphans() {
        let flat = flatten_with_depth(&sample());
        let ids: Vec<_> = flat
            .iter()
            .map(|f| (f.category.id.as_str(), f.level))
            .collect();

        assert_eq!(
            ids,
            vec![
                ("news", 0),
                ("world", 1),
                ("tech", 0),
                ("phones", 1),
                ("deep", 2),
                ("laptops", 1),
            ]
        );
        assert_eq!(flat[4].label(), "— — Deep");
    }

    #[test]
    fn validate_parent_rejects_third_level() {
        let err = validate_parent(&sample(), None, Some("phones")).expect_err("must fail");
        assert!(matches!(err, DomainError::InvalidHierarchy(_)));
    }

    #[test]
    fn validate_parent_rejects_self_and_parent_with_children() {
        let categories = sample();
        assert!(matches!(
            validate_parent(&categories, Some("tech"), Some("tech")),
            Err(DomainError::InvalidHierarchy(_))
        ));
        assert!(matches!(
            validate_parent(&categories, Some("tech"), Some("news")),
            Err(DomainError::InvalidHierarchy(_))
        ));
    }

    #[test]
    fn validate_parent_accepts_root_parent_and_none() {
        let categories = sample();
        assert!(validate_parent(&categories, None, Some("news")).is_ok());
        assert!(validate_parent(&categories, Some("laptops"), Some("news")).is_ok());
        assert!(validate_parent(&categories, Some("tech"), None).is_ok());
    }

    #[test]
    fn validate_parent_reports_unknown_parent() {
        let err = validate_parent(&sample(), None, Some("missing")).expect_err("must fail");
        assert_eq!(err, DomainError::NotFound("category id: missing".to_string()));
    }

    #[test]
    fn draft_normalizes_name_and_builds_slug() {
        let categories = sample();
        let tech = &categories[2];
        let draft = CategoryDraft::new("  Smart   Watches ", None, Some(tech), " d ", "k1, k2");

        assert_eq!(draft.name, "Smart Watches");
        assert_eq!(draft.slug, "smart-watches-tech");
        assert_eq!(draft.parent_id.as_deref(), Some("tech"));
        assert_eq!(draft.description, "d");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn draft_with_blank_name_fails_validation() {
        let draft = CategoryDraft::new("   ", None, None, "", "");
        assert!(draft.validate().is_err());
    }

    #[test]
    fn category_deserializes_populated_parent() {
        let raw = r#"{"_id":"c1","name":"Phones","slug":"phones","parentCategory":{"_id":"tech","name":"Tech"},"description":null}"#;
        let category: Category = serde_json::from_str(raw).expect("valid category");
        assert_eq!(category.parent_id.as_deref(), Some("tech"));
        assert_eq!(category.description, "");
    }
}
