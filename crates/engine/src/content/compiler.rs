use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::info;

use crate::app::{LogicalSize, Vec2};
use crate::nav::{Bounds, PolygonRegion, WalkableArea, DEFAULT_NAVIGATION_CELL_SIZE};
use crate::AppPaths;

use super::database::{CharacterDef, ExitDef, SceneDatabase, SceneDef, SceneDefId};
use super::discovery::{discover_mod_sources, ContentLoadRequest, DiscoveryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    Discovery,
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateDefInMod,
}

#[derive(Debug, Clone)]
pub struct ContentLoadError {
    pub code: ContentErrorCode,
    pub message: String,
    pub mod_id: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (mod={}, file={}, line={}, column={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (mod={}, file={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentLoadError {}

const DEFAULT_LOGICAL_WIDTH: u32 = 1024;
const DEFAULT_LOGICAL_HEIGHT: u32 = 768;

/// Reads every scene file from base content and the enabled mods.
///
/// Within one mod a scene name may appear once; across mods the later mod
/// replaces the whole scene. Exit targets are checked after merging so a mod
/// can point at scenes another mod adds.
pub fn load_scene_database(
    app_paths: &AppPaths,
    request: &ContentLoadRequest,
) -> Result<SceneDatabase, ContentLoadError> {
    let sources = discover_mod_sources(app_paths, request)
        .map_err(|error| map_discovery_error(error, &app_paths.root))?;

    let mut merged = BTreeMap::<String, SceneDef>::new();
    let mut file_count = 0usize;

    for source in &sources {
        let xml_files = collect_xml_files_sorted(&source.source_dir)
            .map_err(|error| read_error(&source.mod_id, error.path, error.source))?;
        let mut seen_in_mod = HashSet::<String>::new();

        for xml_file in xml_files {
            let raw = fs::read_to_string(&xml_file)
                .map_err(|source_err| read_error(&source.mod_id, xml_file.clone(), source_err))?;
            file_count += 1;
            let scenes = parse_scenes_document(&source.mod_id, &xml_file, &raw)?;
            for scene in scenes {
                if !seen_in_mod.insert(scene.name.clone()) {
                    return Err(ContentLoadError {
                        code: ContentErrorCode::DuplicateDefInMod,
                        message: format!(
                            "duplicate SceneDef '{}' in mod '{}'; \
                             each mod may define a scene name only once",
                            scene.name, source.mod_id
                        ),
                        mod_id: source.mod_id.clone(),
                        file_path: xml_file.clone(),
                        location: None,
                    });
                }
                merged.insert(scene.name.clone(), scene);
            }
        }
    }

    for scene in merged.values() {
        for exit in &scene.exits {
            if !merged.contains_key(&exit.target_scene) {
                return Err(ContentLoadError {
                    code: ContentErrorCode::InvalidValue,
                    message: format!(
                        "exit '{}' in scene '{}' targets unknown scene '{}'",
                        exit.name, scene.name, exit.target_scene
                    ),
                    mod_id: scene.mod_id.clone(),
                    file_path: scene.source_file.clone(),
                    location: None,
                });
            }
        }
    }

    let database = SceneDatabase::from_scene_defs(merged.into_values().collect());
    info!(
        mods = sources.len(),
        files = file_count,
        scenes = database.len(),
        "scene_database_loaded"
    );
    Ok(database)
}

/// One parsed document plus where it came from, for error reporting.
struct XmlSource<'a, 'input> {
    mod_id: &'a str,
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl XmlSource<'_, '_> {
    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentLoadError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentLoadError {
            code,
            message,
            mod_id: self.mod_id.to_string(),
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn required_text(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<String, ContentLoadError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("field <{}> must not be empty", field_name),
                node,
            ));
        }
        Ok(value)
    }

    fn parse_value<T: std::str::FromStr>(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
        value: &str,
        expected: &str,
    ) -> Result<T, ContentLoadError> {
        value.parse::<T>().map_err(|_| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{} '{}' is not {}", field_name, value, expected),
                node,
            )
        })
    }

    fn text_u32(&self, node: Node<'_, '_>, field_name: &str) -> Result<u32, ContentLoadError> {
        let value = self.required_text(node, field_name)?;
        self.parse_value(node, field_name, &value, "a non-negative integer")
    }

    fn text_bool(&self, node: Node<'_, '_>, field_name: &str) -> Result<bool, ContentLoadError> {
        let value = self.required_text(node, field_name)?;
        self.parse_value(node, field_name, &value, "true or false")
    }

    fn text_positive_f32(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<f32, ContentLoadError> {
        let value = self.required_text(node, field_name)?;
        let parsed: f32 = self.parse_value(node, field_name, &value, "a valid number")?;
        if !parsed.is_finite() || parsed <= 0.0 {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{} must be finite and > 0", field_name),
                node,
            ));
        }
        Ok(parsed)
    }

    /// Rejects attributes outside `allowed`.
    fn check_attributes(
        &self,
        node: Node<'_, '_>,
        element: &str,
        allowed: &[&str],
    ) -> Result<(), ContentLoadError> {
        for attr in node.attributes() {
            if !allowed.contains(&attr.name()) {
                return Err(self.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown attribute '{}' on <{}>", attr.name(), element),
                    node,
                ));
            }
        }
        Ok(())
    }

    fn required_attr<'n>(
        &self,
        node: Node<'n, '_>,
        element: &str,
        name: &str,
    ) -> Result<&'n str, ContentLoadError> {
        match node.attribute(name).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("missing required attribute '{}' on <{}>", name, element),
                node,
            )),
        }
    }

    fn attr_f32(
        &self,
        node: Node<'_, '_>,
        element: &str,
        name: &str,
    ) -> Result<f32, ContentLoadError> {
        let value = self.required_attr(node, element, name)?;
        let parsed: f32 = self.parse_value(node, name, value, "a valid number")?;
        if !parsed.is_finite() {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("attribute '{}' on <{}> must be finite", name, element),
                node,
            ));
        }
        Ok(parsed)
    }

    fn optional_attr_bool(
        &self,
        node: Node<'_, '_>,
        name: &str,
        default: bool,
    ) -> Result<bool, ContentLoadError> {
        match node.attribute(name) {
            Some(value) => self.parse_value(node, name, value.trim(), "true or false"),
            None => Ok(default),
        }
    }
}

fn parse_scenes_document(
    mod_id: &str,
    file_path: &Path,
    raw: &str,
) -> Result<Vec<SceneDef>, ContentLoadError> {
    let doc = Document::parse(raw).map_err(|error| ContentLoadError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        mod_id: mod_id.to_string(),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let source = XmlSource {
        mod_id,
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Scenes" {
        return Err(source.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Scenes>".to_string(),
            root,
        ));
    }

    let mut scenes = Vec::<SceneDef>::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "SceneDef" {
            return Err(source.error_at(
                ContentErrorCode::UnknownDefType,
                format!(
                    "unsupported def type <{}>; only <SceneDef> is allowed here",
                    child.tag_name().name()
                ),
                child,
            ));
        }
        scenes.push(parse_scene_def(&source, child)?);
    }

    Ok(scenes)
}

fn parse_scene_def(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
) -> Result<SceneDef, ContentLoadError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut name: Option<String> = None;
    let mut logical_width: Option<u32> = None;
    let mut logical_height: Option<u32> = None;
    let mut world_width: Option<(f32, Node<'_, '_>)> = None;
    let mut world_height: Option<(f32, Node<'_, '_>)> = None;
    let mut enable_pathfinding = true;
    let mut navigation_cell_size = DEFAULT_NAVIGATION_CELL_SIZE;
    let mut walkable_area = WalkableArea::new();
    let mut walkable_area_node: Option<Node<'_, '_>> = None;
    let mut characters = Vec::<CharacterDef>::new();
    let mut exits = Vec::<ExitDef>::new();

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(source.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{}> in <SceneDef>", field_name),
                field,
            ));
        }

        match field_name.as_str() {
            "name" => name = Some(source.required_text(field, "name")?),
            "logicalWidth" => {
                logical_width = Some(positive_u32(source, field, "logicalWidth")?);
            }
            "logicalHeight" => {
                logical_height = Some(positive_u32(source, field, "logicalHeight")?);
            }
            "worldWidth" => {
                world_width = Some((source.text_positive_f32(field, "worldWidth")?, field));
            }
            "worldHeight" => {
                world_height = Some((source.text_positive_f32(field, "worldHeight")?, field));
            }
            "enablePathfinding" => {
                enable_pathfinding = source.text_bool(field, "enablePathfinding")?;
            }
            "navigationCellSize" => {
                navigation_cell_size = positive_u32(source, field, "navigationCellSize")?;
            }
            "walkableArea" => {
                walkable_area = parse_walkable_area(source, field)?;
                walkable_area_node = Some(field);
            }
            "characters" => characters = parse_characters(source, field)?,
            "exits" => exits = parse_exits(source, field)?,
            _ => {
                return Err(source.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{}> in <SceneDef>", field_name),
                    field,
                ))
            }
        }
    }

    let Some(name) = name else {
        return Err(source.error_at(
            ContentErrorCode::MissingField,
            "missing required field <name> in <SceneDef>".to_string(),
            node,
        ));
    };
    if enable_pathfinding && walkable_area.is_empty() {
        return Err(source.error_at(
            ContentErrorCode::MissingField,
            format!(
                "scene '{}' enables pathfinding but has no <walkableArea> regions",
                name
            ),
            node,
        ));
    }

    let logical_size = LogicalSize::new(
        logical_width.unwrap_or(DEFAULT_LOGICAL_WIDTH),
        logical_height.unwrap_or(DEFAULT_LOGICAL_HEIGHT),
    );
    let world_width = world_extent(source, world_width, "worldWidth", logical_size.width)?;
    let world_height = world_extent(source, world_height, "worldHeight", logical_size.height)?;

    // Walkable regions must stay inside the world; obstacles may overhang.
    let world_bounds = Bounds::from_size(world_width, world_height);
    for region in walkable_area.regions() {
        if region.walkable() && !world_bounds.encloses(&region.bounds()) {
            let region_node = walkable_area_node
                .and_then(|area| {
                    area.children().find(|child| {
                        child.attribute("name").map(str::trim) == Some(region.name())
                    })
                })
                .unwrap_or(node);
            return Err(source.error_at(
                ContentErrorCode::InvalidValue,
                format!(
                    "walkable region '{}' extends outside the {}x{} world of scene '{}'",
                    region.name(),
                    world_width,
                    world_height,
                    name
                ),
                region_node,
            ));
        }
    }

    Ok(SceneDef {
        id: SceneDefId(0),
        name,
        logical_size,
        world_width,
        world_height,
        enable_pathfinding,
        navigation_cell_size,
        walkable_area,
        characters,
        exits,
        mod_id: source.mod_id.to_string(),
        source_file: source.file_path.to_path_buf(),
    })
}

/// World extent along one axis; defaults to the logical size and may not be
/// smaller than it.
fn world_extent(
    source: &XmlSource<'_, '_>,
    value: Option<(f32, Node<'_, '_>)>,
    field_name: &str,
    logical: u32,
) -> Result<f32, ContentLoadError> {
    let Some((value, field)) = value else {
        return Ok(logical as f32);
    };
    if value < logical as f32 {
        return Err(source.error_at(
            ContentErrorCode::InvalidValue,
            format!(
                "{} {} is smaller than the logical size {}",
                field_name, value, logical
            ),
            field,
        ));
    }
    Ok(value)
}

fn positive_u32(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<u32, ContentLoadError> {
    let value = source.text_u32(node, field_name)?;
    if value == 0 {
        return Err(source.error_at(
            ContentErrorCode::InvalidValue,
            format!("{} must be > 0", field_name),
            node,
        ));
    }
    Ok(value)
}

fn expect_children<'a, 'input>(
    source: &XmlSource<'_, '_>,
    node: Node<'a, 'input>,
    parent: &str,
    child: &str,
) -> Result<Vec<Node<'a, 'input>>, ContentLoadError> {
    let mut children = Vec::new();
    for item in node.children().filter(|item| item.is_element()) {
        if item.tag_name().name() != child {
            return Err(source.error_at(
                ContentErrorCode::UnknownField,
                format!(
                    "unexpected <{}> in <{}>; expected <{}>",
                    item.tag_name().name(),
                    parent,
                    child
                ),
                item,
            ));
        }
        children.push(item);
    }
    Ok(children)
}

fn parse_walkable_area(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
) -> Result<WalkableArea, ContentLoadError> {
    let mut area = WalkableArea::new();
    for region_node in expect_children(source, node, "walkableArea", "region")? {
        source.check_attributes(region_node, "region", &["name", "walkable"])?;
        let name = source.required_attr(region_node, "region", "name")?;
        let walkable = source.optional_attr_bool(region_node, "walkable", true)?;

        let mut vertices = Vec::new();
        for point in expect_children(source, region_node, "region", "point")? {
            source.check_attributes(point, "point", &["x", "y"])?;
            vertices.push(Vec2::new(
                source.attr_f32(point, "point", "x")?,
                source.attr_f32(point, "point", "y")?,
            ));
        }

        let region = PolygonRegion::new(name, walkable, vertices).map_err(|error| {
            source.error_at(ContentErrorCode::InvalidValue, error.to_string(), region_node)
        })?;
        area.add_region(region).map_err(|error| {
            source.error_at(ContentErrorCode::InvalidValue, error.to_string(), region_node)
        })?;
    }
    Ok(area)
}

fn parse_characters(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
) -> Result<Vec<CharacterDef>, ContentLoadError> {
    let mut characters = Vec::<CharacterDef>::new();
    for item in expect_children(source, node, "characters", "character")? {
        source.check_attributes(item, "character", &["name", "x", "y", "speed", "player"])?;
        let name = source.required_attr(item, "character", "name")?.to_string();
        if characters.iter().any(|existing| existing.name == name) {
            return Err(source.error_at(
                ContentErrorCode::InvalidValue,
                format!("duplicate character name '{}'", name),
                item,
            ));
        }
        let walk_speed = source.attr_f32(item, "character", "speed")?;
        if walk_speed < 0.0 {
            return Err(source.error_at(
                ContentErrorCode::InvalidValue,
                "character speed must be >= 0".to_string(),
                item,
            ));
        }
        let player = source.optional_attr_bool(item, "player", false)?;
        if player && characters.iter().any(|existing| existing.player) {
            return Err(source.error_at(
                ContentErrorCode::InvalidValue,
                format!("character '{}' is a second player; a scene has at most one", name),
                item,
            ));
        }
        characters.push(CharacterDef {
            name,
            position: Vec2::new(
                source.attr_f32(item, "character", "x")?,
                source.attr_f32(item, "character", "y")?,
            ),
            walk_speed,
            player,
        });
    }
    Ok(characters)
}

fn parse_exits(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
) -> Result<Vec<ExitDef>, ContentLoadError> {
    const ATTRS: [&str; 8] = ["name", "target", "x", "y", "width", "height", "walkX", "walkY"];

    let mut exits = Vec::<ExitDef>::new();
    for item in expect_children(source, node, "exits", "exit")? {
        source.check_attributes(item, "exit", &ATTRS)?;
        let name = source.required_attr(item, "exit", "name")?.to_string();
        let target_scene = source.required_attr(item, "exit", "target")?.to_string();
        let x = source.attr_f32(item, "exit", "x")?;
        let y = source.attr_f32(item, "exit", "y")?;
        let width = source.attr_f32(item, "exit", "width")?;
        let height = source.attr_f32(item, "exit", "height")?;
        if width <= 0.0 || height <= 0.0 {
            return Err(source.error_at(
                ContentErrorCode::InvalidValue,
                format!("exit '{}' hotspot must have positive width and height", name),
                item,
            ));
        }
        exits.push(ExitDef {
            name,
            target_scene,
            hotspot: Bounds::new(Vec2::new(x, y), Vec2::new(x + width, y + height)),
            walk_to: Vec2::new(
                source.attr_f32(item, "exit", "walkX")?,
                source.attr_f32(item, "exit", "walkY")?,
            ),
        });
    }
    Ok(exits)
}

struct ReadError {
    path: PathBuf,
    source: std::io::Error,
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut files = Vec::<PathBuf>::new();
    collect_recursive(root, &mut files)?;
    files.sort_by_cached_key(|path| normalize_rel_path(path.strip_prefix(root).unwrap_or(path)));
    Ok(files)
}

fn collect_recursive(current: &Path, files: &mut Vec<PathBuf>) -> Result<(), ReadError> {
    let entries = fs::read_dir(current).map_err(|source| ReadError {
        path: current.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ReadError {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_error(mod_id: &str, path: PathBuf, source: std::io::Error) -> ContentLoadError {
    ContentLoadError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read XML file: {source}"),
        mod_id: mod_id.to_string(),
        file_path: path,
        location: None,
    }
}

fn map_discovery_error(error: DiscoveryError, root: &Path) -> ContentLoadError {
    match error {
        DiscoveryError::EnabledModMissing {
            mod_id,
            expected_dir,
        } => ContentLoadError {
            code: ContentErrorCode::Discovery,
            message: format!(
                "enabled mod '{}' not found at {}; check enabled mod list",
                mod_id,
                expected_dir.display()
            ),
            mod_id,
            file_path: expected_dir,
            location: None,
        },
        other => ContentLoadError {
            code: ContentErrorCode::Discovery,
            message: other.to_string(),
            mod_id: "<discovery>".to_string(),
            file_path: root.to_path_buf(),
            location: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn setup_app_paths(root: &Path) -> AppPaths {
        let app_paths = AppPaths::from_root(root);
        fs::create_dir_all(&app_paths.base_content_dir).expect("base");
        fs::create_dir_all(&app_paths.mods_dir).expect("mods");
        app_paths
    }

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    const SQUARE: &str = r#"<walkableArea>
        <region name="floor">
            <point x="0" y="0"/><point x="200" y="0"/><point x="200" y="100"/><point x="0" y="100"/>
        </region>
    </walkableArea>"#;

    fn scene_xml(name: &str, extra: &str) -> String {
        format!("<SceneDef><name>{name}</name>{SQUARE}{extra}</SceneDef>")
    }

    fn load(app: &AppPaths) -> Result<SceneDatabase, ContentLoadError> {
        load_scene_database(app, &ContentLoadRequest::default())
    }

    #[test]
    fn valid_scenes_load_sorted_by_name_with_defaults() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(
            &app.base_content_dir.join("scenes.xml"),
            &format!(
                "<Scenes>{}{}</Scenes>",
                scene_xml("town", ""),
                scene_xml(
                    "harbor",
                    r#"<characters>
                        <character name="hero" x="10" y="20" speed="120" player="true"/>
                        <character name="sailor" x="50" y="50" speed="40"/>
                    </characters>
                    <exits>
                        <exit name="road" target="town" x="180" y="0" width="20" height="100"
                              walkX="190" walkY="50"/>
                    </exits>"#
                )
            ),
        );

        let db = load(&app).expect("load");
        let names = db.scenes().iter().map(|scene| scene.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["harbor", "town"]);

        let harbor = db.scene_by_name("harbor").expect("harbor");
        assert_eq!(harbor.id, db.scene_id_by_name("harbor").expect("id"));
        assert_eq!(harbor.logical_size, LogicalSize::new(1024, 768));
        assert_eq!(harbor.world_width, 1024.0);
        assert!(harbor.enable_pathfinding);
        assert_eq!(harbor.navigation_cell_size, DEFAULT_NAVIGATION_CELL_SIZE);
        assert_eq!(harbor.walkable_area.regions().len(), 1);
        assert_eq!(harbor.characters.len(), 2);
        assert!(harbor.characters[0].player);
        assert!(!harbor.characters[1].player);
        let exit = harbor.exit_at(Vec2::new(185.0, 10.0)).expect("exit");
        assert_eq!(exit.target_scene, "town");
        assert_eq!(exit.walk_to, Vec2::new(190.0, 50.0));
        assert!(harbor.exit_at(Vec2::new(20.0, 10.0)).is_none());
        assert_eq!(harbor.mod_id, "base");
    }

    #[test]
    fn missing_name_reports_mod_file_and_location() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(
            &app.base_content_dir.join("scenes.xml"),
            &format!("<Scenes>\n  <SceneDef>{SQUARE}</SceneDef>\n</Scenes>"),
        );
        let err = load(&app).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::MissingField);
        assert_eq!(err.mod_id, "base");
        assert!(err
            .file_path
            .ends_with(Path::new("assets").join("base").join("scenes.xml")));
        let location = err.location.expect("location");
        assert_eq!(location.line, 2);
        assert_eq!(location.column, 3);
    }

    #[test]
    fn malformed_xml_and_wrong_root_are_distinguished() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(&app.base_content_dir.join("a.xml"), "<Scenes><SceneDef>");
        assert_eq!(load(&app).expect_err("malformed").code, ContentErrorCode::XmlMalformed);

        write_file(&app.base_content_dir.join("a.xml"), "<Defs/>");
        assert_eq!(load(&app).expect_err("root").code, ContentErrorCode::InvalidRoot);

        write_file(&app.base_content_dir.join("a.xml"), "<Scenes><EntityDef/></Scenes>");
        assert_eq!(load(&app).expect_err("type").code, ContentErrorCode::UnknownDefType);
    }

    #[test]
    fn unknown_and_duplicate_fields_are_rejected() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(
            &app.base_content_dir.join("a.xml"),
            &format!("<Scenes>{}</Scenes>", scene_xml("a", "<music>sea</music>")),
        );
        assert_eq!(load(&app).expect_err("unknown").code, ContentErrorCode::UnknownField);

        write_file(
            &app.base_content_dir.join("a.xml"),
            &format!("<Scenes>{}</Scenes>", scene_xml("a", "<name>b</name>")),
        );
        assert_eq!(load(&app).expect_err("dup").code, ContentErrorCode::DuplicateField);

        write_file(
            &app.base_content_dir.join("a.xml"),
            &format!(
                "<Scenes>{}</Scenes>",
                scene_xml(
                    "a",
                    r#"<characters>
                        <character name="x" x="1" y="1" speed="1" hat="red"/>
                    </characters>"#
                )
            ),
        );
        assert_eq!(load(&app).expect_err("attr").code, ContentErrorCode::UnknownField);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            scene_xml("a", "<navigationCellSize>0</navigationCellSize>"),
            scene_xml("a", "<enablePathfinding>maybe</enablePathfinding>"),
            scene_xml("a", "<worldWidth>-5</worldWidth>"),
            scene_xml(
                "a",
                r#"<characters>
                    <character name="p1" x="1" y="1" speed="1" player="true"/>
                    <character name="p2" x="2" y="2" speed="1" player="true"/>
                </characters>"#,
            ),
            scene_xml(
                "a",
                r#"<exits>
                    <exit name="e" target="a" x="0" y="0" width="0" height="5" walkX="1" walkY="1"/>
                </exits>"#,
            ),
            r#"<SceneDef><name>a</name><walkableArea>
                <region name="line">
                    <point x="0" y="0"/><point x="5" y="5"/><point x="10" y="10"/>
                </region>
            </walkableArea></SceneDef>"#
                .to_string(),
        ];

        for (idx, case) in cases.iter().enumerate() {
            let temp = TempDir::new().expect("temp");
            let app = setup_app_paths(temp.path());
            write_file(&app.base_content_dir.join("a.xml"), &format!("<Scenes>{case}</Scenes>"));
            let err = load(&app).expect_err("invalid");
            assert_eq!(err.code, ContentErrorCode::InvalidValue, "case {idx}: {err}");
            assert!(err.location.is_some(), "case {idx}");
        }
    }

    #[test]
    fn walkable_region_past_world_edge_is_rejected_at_region() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(
            &app.base_content_dir.join("a.xml"),
            r#"<Scenes>
<SceneDef>
    <name>dock</name>
    <logicalWidth>800</logicalWidth>
    <logicalHeight>600</logicalHeight>
    <walkableArea>
        <region name="wall" walkable="false">
            <point x="350" y="0"/><point x="450" y="0"/>
            <point x="450" y="650"/><point x="350" y="650"/>
        </region>
        <region name="floor">
            <point x="0" y="0"/><point x="800" y="0"/>
            <point x="800" y="800"/><point x="0" y="800"/>
        </region>
    </walkableArea>
</SceneDef>
</Scenes>"#,
        );
        let err = load(&app).expect_err("floor overhangs");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);
        assert!(err.message.contains("'floor'"), "{err}");
        let location = err.location.expect("location");
        assert_eq!(location.line, 11);

        // An obstacle may overhang the world edge.
        write_file(
            &app.base_content_dir.join("a.xml"),
            &format!(
                "<Scenes>{}</Scenes>",
                scene_xml("dock", "<worldHeight>768</worldHeight>").replace(
                    "</walkableArea>",
                    r#"<region name="rock" walkable="false">
                        <point x="100" y="50"/><point x="150" y="50"/><point x="150" y="900"/>
                    </region></walkableArea>"#
                )
            ),
        );
        let db = load(&app).expect("overhanging obstacle");
        assert_eq!(db.scene_by_name("dock").expect("dock").walkable_area.regions().len(), 2);
    }

    #[test]
    fn world_smaller_than_logical_view_is_rejected() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(
            &app.base_content_dir.join("a.xml"),
            &format!(
                "<Scenes>{}</Scenes>",
                scene_xml("a", "<logicalWidth>1024</logicalWidth><worldWidth>200</worldWidth>")
            ),
        );
        let err = load(&app).expect_err("narrow world");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);
        assert!(err.message.contains("worldWidth"), "{err}");
        assert!(err.location.is_some());

        write_file(
            &app.base_content_dir.join("a.xml"),
            &format!(
                "<Scenes>{}</Scenes>",
                scene_xml("a", "<logicalHeight>600</logicalHeight><worldHeight>600</worldHeight>")
            ),
        );
        let db = load(&app).expect("equal extent");
        assert_eq!(db.scene_by_name("a").expect("a").world_height, 600.0);
    }

    #[test]
    fn pathfinding_scene_without_walkable_area_is_rejected() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(
            &app.base_content_dir.join("a.xml"),
            "<Scenes><SceneDef><name>a</name></SceneDef></Scenes>",
        );
        assert_eq!(load(&app).expect_err("empty").code, ContentErrorCode::MissingField);

        write_file(
            &app.base_content_dir.join("a.xml"),
            "<Scenes><SceneDef><name>a</name>\
             <enablePathfinding>false</enablePathfinding></SceneDef></Scenes>",
        );
        let db = load(&app).expect("static scene");
        assert!(!db.scene_by_name("a").expect("a").enable_pathfinding);
    }

    #[test]
    fn duplicate_scene_in_one_mod_is_error_but_later_mod_overrides() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(
            &app.base_content_dir.join("a.xml"),
            &format!("<Scenes>{}</Scenes>", scene_xml("harbor", "")),
        );
        write_file(
            &app.base_content_dir.join("nested").join("b.xml"),
            &format!("<Scenes>{}</Scenes>", scene_xml("harbor", "")),
        );
        let err = load(&app).expect_err("dup");
        assert_eq!(err.code, ContentErrorCode::DuplicateDefInMod);

        fs::remove_file(app.base_content_dir.join("nested").join("b.xml")).expect("rm");
        write_file(
            &app.mods_dir.join("night").join("harbor.xml"),
            &format!(
                "<Scenes>{}</Scenes>",
                scene_xml("harbor", "<navigationCellSize>8</navigationCellSize>")
            ),
        );
        let db = load_scene_database(
            &app,
            &ContentLoadRequest {
                enabled_mods: vec!["night".to_string()],
            },
        )
        .expect("override");
        let harbor = db.scene_by_name("harbor").expect("harbor");
        assert_eq!(harbor.navigation_cell_size, 8);
        assert_eq!(harbor.mod_id, "night");
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn exit_to_unknown_scene_is_rejected_after_merge() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        let exit = r#"<exits>
            <exit name="gate" target="castle" x="0" y="0" width="10" height="10"
                  walkX="5" walkY="5"/>
        </exits>"#;
        write_file(
            &app.base_content_dir.join("a.xml"),
            &format!("<Scenes>{}</Scenes>", scene_xml("town", exit)),
        );
        let err = load(&app).expect_err("unknown target");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);
        assert!(err.message.contains("castle"));

        write_file(
            &app.mods_dir.join("castle").join("castle.xml"),
            &format!("<Scenes>{}</Scenes>", scene_xml("castle", "")),
        );
        let db = load_scene_database(
            &app,
            &ContentLoadRequest {
                enabled_mods: vec!["castle".to_string()],
            },
        )
        .expect("mod adds target");
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn missing_enabled_mod_maps_to_discovery_code() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        let err = load_scene_database(
            &app,
            &ContentLoadRequest {
                enabled_mods: vec!["ghost".to_string()],
            },
        )
        .expect_err("missing");
        assert_eq!(err.code, ContentErrorCode::Discovery);
        assert_eq!(err.mod_id, "ghost");
    }
}
