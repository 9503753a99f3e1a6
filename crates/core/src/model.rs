//! # Model Component
//!
//! Owns a model's derivatives and decides which one is displayed.
//!
//! ## Table of Contents
//! - **ModelState**: Empty / Loading / Displayed
//! - **PendingLoad**: Ticketed load in flight
//! - **ModelComponent**: Derivative registry, auto-load sequencing, quality
//!   switching, unit scaling and bounding box bookkeeping
//!
//! ## Loading
//!
//! A load is split into three steps so that the fetch itself never borrows
//! the model:
//!
//! 1. [`ModelComponent::begin_load`] issues a generation ticket and snapshots
//!    the derivative's assets.
//! 2. [`PendingLoad::fetch`] imports the assets through the [`AssetLoader`].
//! 3. [`ModelComponent::complete_load`] swaps the result in, unless a newer
//!    load was started in the meantime, in which case the result is disposed.
//!
//! [`ModelComponent::load_derivative`] runs all three in sequence. The old
//! object stays displayed until the new one is fully loaded.

use crate::asset::{Asset, MapType};
use crate::bounds::BoundingBox;
use crate::config::ViewerConfig;
use crate::derivative::{fetch_object, Derivative, DerivativeKey, Quality, Usage};
use crate::derivative_list::DerivativeList;
use crate::document::ModelRecord;
use crate::error::{Result, VoyagerError};
use crate::events::{emit, EventSender, SceneEvent};
use crate::loader::{AssetLoader, AssetPaths};
use crate::object::SceneObject;
use crate::units::{unit_scale, UnitType};
use glam::{Mat4, Quat, Vec3};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Display state of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// Nothing displayed, nothing loading
    Empty,
    /// First load in flight
    Loading,
    /// A derivative is displayed (another may be loading)
    Displayed,
}

/// Debug outline drawn around the model's bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsFrame {
    pub bounds: BoundingBox,
}

/// A load that has been started but not yet applied
#[derive(Debug, Clone)]
pub struct PendingLoad {
    ticket: u64,
    key: DerivativeKey,
    assets: Vec<Asset>,
    paths: AssetPaths,
}

impl PendingLoad {
    pub fn key(&self) -> DerivativeKey {
        self.key
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Import the snapshotted assets
    pub async fn fetch(&self, loader: &dyn AssetLoader) -> Result<Box<dyn SceneObject>> {
        debug!(derivative = %self.key, ticket = self.ticket, "fetching derivative");
        fetch_object(loader, &self.paths, &self.assets).await
    }
}

/// Model component attached to a scene node
#[derive(Debug)]
pub struct ModelComponent {
    id: Uuid,
    derivatives: DerivativeList,
    active: Option<DerivativeKey>,
    bounding_box: Option<BoundingBox>,
    bounds_frame: Option<BoundsFrame>,
    local_units: UnitType,
    global_units: UnitType,
    unit_scale: f64,
    position: Vec3,
    rotation: Quat,
    auto_load: bool,
    usage: Usage,
    quality: Quality,
    paths: AssetPaths,
    events: Option<EventSender>,
    generation: u64,
    in_flight: Option<u64>,
    disposed: bool,
}

impl Default for ModelComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelComponent {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            derivatives: DerivativeList::new(),
            active: None,
            bounding_box: None,
            bounds_frame: None,
            local_units: UnitType::Meters,
            global_units: UnitType::Meters,
            unit_scale: 1.0,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            auto_load: true,
            usage: Usage::Web,
            quality: Quality::High,
            paths: AssetPaths::default(),
            events: None,
            generation: 0,
            in_flight: None,
            disposed: false,
        }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Apply viewer settings: auto-load, target tier, display units, asset base
    pub fn configure(&mut self, config: &ViewerConfig) {
        self.auto_load = config.auto_load;
        self.usage = config.usage;
        self.quality = config.quality;
        self.paths = AssetPaths::new(config.asset_base.clone());
        self.set_global_units(config.global_units);
    }

    pub fn with_config(mut self, config: &ViewerConfig) -> Self {
        self.configure(config);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn derivatives(&self) -> &DerivativeList {
        &self.derivatives
    }

    pub fn active_key(&self) -> Option<DerivativeKey> {
        self.active
    }

    pub fn active_derivative(&self) -> Option<&Derivative> {
        self.derivatives.get(self.active?)
    }

    pub fn state(&self) -> ModelState {
        if self.active.is_some() {
            ModelState::Displayed
        } else if self.in_flight.is_some() {
            ModelState::Loading
        } else {
            ModelState::Empty
        }
    }

    pub fn auto_load_enabled(&self) -> bool {
        self.auto_load
    }

    pub fn set_auto_load(&mut self, auto_load: bool) {
        self.auto_load = auto_load;
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn set_usage(&mut self, usage: Usage) {
        self.usage = usage;
    }

    /// Target quality
    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn asset_paths(&self) -> &AssetPaths {
        &self.paths
    }

    pub fn set_asset_base(&mut self, base: Option<String>) {
        self.paths = AssetPaths::new(base);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    pub fn bounds_frame(&self) -> Option<&BoundsFrame> {
        self.bounds_frame.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // ========================================================================
    // Units and transform
    // ========================================================================

    pub fn local_units(&self) -> UnitType {
        self.local_units
    }

    pub fn global_units(&self) -> UnitType {
        self.global_units
    }

    /// Units the model was authored in
    pub fn set_units(&mut self, units: UnitType) {
        self.local_units = units;
        self.update_unit_scale();
    }

    /// Units of the scene the model is displayed in
    pub fn set_global_units(&mut self, units: UnitType) {
        self.global_units = units;
        self.update_unit_scale();
    }

    pub fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    fn update_unit_scale(&mut self) {
        self.unit_scale = unit_scale(self.local_units, self.global_units);
    }

    /// Local matrix: translate(position * s) * rotate * scale(s)
    pub fn matrix(&self) -> Mat4 {
        let s = self.unit_scale as f32;
        Mat4::from_scale_rotation_translation(Vec3::splat(s), self.rotation, self.position * s)
    }

    /// Bounding box in the parent's space
    pub fn world_bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box.map(|b| b.transformed(&self.matrix()))
    }

    /// Move the model so the center of its rotated bounds sits at the origin
    pub fn center(&mut self) {
        if let Some(bounds) = self.bounding_box {
            self.position = -bounds.rotated(self.rotation).center();
        }
    }

    // ========================================================================
    // Derivatives
    // ========================================================================

    pub fn add_derivative(&mut self, derivative: Derivative) -> Result<&mut Derivative> {
        self.derivatives.add(derivative)
    }

    /// Add a derivative made of one full scene asset
    pub fn create_model_derivative(
        &mut self,
        uri: impl Into<String>,
        quality: Quality,
    ) -> Result<&mut Derivative> {
        let mut derivative = Derivative::new(self.usage, quality);
        derivative.create_model_asset(uri);
        self.derivatives.add(derivative)
    }

    /// Add a derivative made of a mesh and its texture maps
    pub fn create_mesh_derivative(
        &mut self,
        mesh_uri: impl Into<String>,
        textures: &[(MapType, &str)],
        quality: Quality,
    ) -> Result<&mut Derivative> {
        let mut derivative = Derivative::new(self.usage, quality);
        derivative.create_mesh_asset(mesh_uri);
        for (map, uri) in textures {
            derivative.create_texture_asset(*uri, *map);
        }
        self.derivatives.add(derivative)
    }

    /// Keys to load on activation: the lowest available tier, then the target
    pub fn load_sequence(&self, quality: Quality) -> Vec<DerivativeKey> {
        let mut sequence = Vec::with_capacity(2);
        let lowest = self
            .derivatives
            .lowest(self.usage)
            .filter(|d| d.quality().ladder_index().is_some())
            .map(Derivative::key);
        let target = self.derivatives.select_key(self.usage, quality);

        for key in [lowest, target].into_iter().flatten() {
            if !sequence.contains(&key) {
                sequence.push(key);
            }
        }

        debug!(model = %self.id, sequence = ?sequence, "planned load sequence");
        sequence
    }

    /// Called when the model becomes part of a live scene
    pub async fn activate(&mut self, loader: &dyn AssetLoader) {
        if self.auto_load && self.active.is_none() {
            self.auto_load(loader).await;
        }
    }

    /// Load the lowest tier followed by the target tier, one after another.
    /// Failures are logged and leave the previous state in place.
    pub async fn auto_load(&mut self, loader: &dyn AssetLoader) {
        for key in self.load_sequence(self.quality) {
            if let Err(e) = self.load_derivative(loader, key).await {
                warn!(model = %self.id, derivative = %key, error = %e, "failed to load derivative");
            }
        }
    }

    /// Change the target quality. After the initial load, the closest
    /// matching derivative is loaded and swapped in if it differs.
    pub async fn set_quality(&mut self, loader: &dyn AssetLoader, quality: Quality) {
        self.quality = quality;

        let Some(active) = self.active else {
            return;
        };
        let Some(target) = self.derivatives.select_key(self.usage, quality) else {
            return;
        };
        if target == active {
            return;
        }

        if let Err(e) = self.load_derivative(loader, target).await {
            warn!(model = %self.id, derivative = %target, error = %e, "failed to load derivative");
        }
    }

    /// Fetch a derivative and display it. Returns an error when the key is
    /// unknown or the loader fails; the previous derivative stays displayed.
    pub async fn load_derivative(&mut self, loader: &dyn AssetLoader, key: DerivativeKey) -> Result<()> {
        let pending = self.begin_load(key)?;
        match pending.fetch(loader).await {
            Ok(object) => {
                self.complete_load(pending, object);
                Ok(())
            }
            Err(e) => {
                self.abort_load(pending);
                Err(e)
            }
        }
    }

    /// Start a load: issue a ticket and snapshot the derivative's assets.
    /// Any load started earlier becomes stale.
    pub fn begin_load(&mut self, key: DerivativeKey) -> Result<PendingLoad> {
        let derivative = self.derivatives.get(key).ok_or(VoyagerError::UnknownDerivative {
            usage: key.usage,
            quality: key.quality,
        })?;
        let assets = derivative.assets().to_vec();

        self.generation += 1;
        self.in_flight = Some(self.generation);

        Ok(PendingLoad {
            ticket: self.generation,
            key,
            assets,
            paths: self.paths.clone(),
        })
    }

    /// Apply a fetched object. Returns false and disposes the object when
    /// the load was superseded or the model is gone.
    pub fn complete_load(&mut self, pending: PendingLoad, mut object: Box<dyn SceneObject>) -> bool {
        let current = !self.disposed && pending.ticket == self.generation;
        if !current || !self.derivatives.contains(pending.key) {
            warn!(
                model = %self.id,
                derivative = %pending.key,
                ticket = pending.ticket,
                generation = self.generation,
                "discarding stale derivative load"
            );
            object.dispose();
            return false;
        }

        self.in_flight = None;

        if let Some(previous) = self.active.take() {
            if let Some(derivative) = self.derivatives.get_mut(previous) {
                derivative.dispose();
            }
        }
        self.bounds_frame = None;

        object.attach();
        let bounds = object.bounding_box();
        if let Some(derivative) = self.derivatives.get_mut(pending.key) {
            derivative.set_object(object);
        }
        self.active = Some(pending.key);

        if let Some(bounds) = bounds {
            self.bounding_box = Some(bounds);
            self.bounds_frame = Some(BoundsFrame { bounds });
        }

        info!(model = %self.id, derivative = %pending.key, "derivative displayed");

        emit(
            self.events.as_ref(),
            SceneEvent::DerivativeChanged {
                model: self.id,
                usage: pending.key.usage,
                quality: pending.key.quality,
            },
        );
        if let Some(bounds) = bounds {
            emit(
                self.events.as_ref(),
                SceneEvent::BoundingBoxChanged { model: self.id, bounds },
            );
        }
        true
    }

    /// Drop a failed load. Only clears the loading state if it is still current.
    pub fn abort_load(&mut self, pending: PendingLoad) {
        if self.in_flight == Some(pending.ticket) {
            self.in_flight = None;
        }
    }

    /// Dispose every derivative. Loads still in flight become stale.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.derivatives.clear();
        self.active = None;
        self.bounds_frame = None;
        self.in_flight = None;
        self.generation += 1;
        self.disposed = true;
    }

    // ========================================================================
    // Records
    // ========================================================================

    /// Populate from a model record. Fails if derivatives are already present.
    pub fn from_data(&mut self, record: &ModelRecord) -> Result<()> {
        if !self.derivatives.is_empty() {
            return Err(VoyagerError::AlreadyPopulated);
        }

        // Build the list first so a bad record leaves the model untouched
        let mut derivatives = DerivativeList::new();
        for derivative in &record.derivatives {
            derivatives.add(Derivative::from_record(derivative.clone()))?;
        }
        self.derivatives = derivatives;
        self.set_units(record.units);

        if let Some(bounds) = record.bounding_box {
            self.bounding_box = Some(bounds);
            self.bounds_frame = Some(BoundsFrame { bounds });
        }
        if let Some(translation) = record.translation {
            self.position = translation;
        }
        if let Some(rotation) = record.rotation {
            self.rotation = rotation;
        }

        Ok(())
    }

    pub fn to_data(&self) -> ModelRecord {
        ModelRecord {
            units: self.local_units,
            derivatives: self.derivatives.iter().map(Derivative::to_record).collect(),
            bounding_box: self.bounding_box,
            translation: (self.position != Vec3::ZERO).then_some(self.position),
            rotation: (self.rotation != Quat::IDENTITY).then_some(self.rotation),
        }
    }
}

impl Drop for ModelComponent {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetType;
    use crate::derivative::DerivativeRecord;
    use crate::events;
    use crate::testing::{LoaderCall, MockLoader};

    fn key(quality: Quality) -> DerivativeKey {
        DerivativeKey::new(Usage::Web, quality)
    }

    fn model_with(qualities: &[Quality]) -> ModelComponent {
        let mut model = ModelComponent::new();
        for q in qualities {
            model
                .create_model_derivative(format!("{}.glb", q.to_string().to_lowercase()), *q)
                .unwrap();
        }
        model
    }

    #[tokio::test]
    async fn test_auto_load_is_sequential() {
        let loader = MockLoader::new();
        let mut model = model_with(&[Quality::Thumb, Quality::High]);

        model.activate(&loader).await;

        assert_eq!(
            loader.calls(),
            vec![
                LoaderCall::Model("thumb.glb".into()),
                LoaderCall::Model("high.glb".into()),
            ]
        );
        assert_eq!(
            loader.entries(),
            vec![
                "begin model thumb.glb",
                "end model thumb.glb",
                "attach thumb.glb",
                "begin model high.glb",
                "end model high.glb",
                "dispose thumb.glb",
                "attach high.glb",
            ]
        );
        assert_eq!(model.active_key(), Some(key(Quality::High)));
        assert_eq!(model.state(), ModelState::Displayed);
    }

    #[tokio::test]
    async fn test_auto_load_single_when_target_is_lowest() {
        let loader = MockLoader::new();
        let mut model = model_with(&[Quality::Medium]);
        model.activate(&loader).await;
        assert_eq!(loader.calls().len(), 1);
        assert_eq!(model.active_key(), Some(key(Quality::Medium)));
    }

    #[tokio::test]
    async fn test_activate_respects_flag_and_active() {
        let loader = MockLoader::new();
        let mut model = model_with(&[Quality::High]);
        model.set_auto_load(false);
        model.activate(&loader).await;
        assert!(loader.calls().is_empty());
        assert_eq!(model.state(), ModelState::Empty);

        model.set_auto_load(true);
        model.activate(&loader).await;
        model.activate(&loader).await;
        assert_eq!(loader.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_set_quality_swaps() {
        let loader = MockLoader::new();
        let mut model = model_with(&[Quality::Low, Quality::High]);
        model.set_auto_load(false);

        // Before the first load only the target changes
        model.set_quality(&loader, Quality::Low).await;
        assert!(loader.calls().is_empty());

        model.load_derivative(&loader, key(Quality::Low)).await.unwrap();
        model.set_quality(&loader, Quality::Highest).await;
        assert_eq!(model.active_key(), Some(key(Quality::High)));
        assert_eq!(model.quality(), Quality::Highest);

        // Same selection, nothing to load
        model.set_quality(&loader, Quality::High).await;
        assert_eq!(loader.calls().len(), 2);

        let entries = loader.entries();
        let dispose_low = entries.iter().filter(|e| *e == "dispose low.glb").count();
        let attach_high = entries.iter().filter(|e| *e == "attach high.glb").count();
        assert_eq!(dispose_low, 1);
        assert_eq!(attach_high, 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous() {
        let loader = MockLoader::new().with_failure("high.glb");
        let mut model = model_with(&[Quality::Thumb, Quality::High]);

        model.activate(&loader).await;

        assert_eq!(model.active_key(), Some(key(Quality::Thumb)));
        assert_eq!(model.state(), ModelState::Displayed);
        assert!(model.active_derivative().unwrap().has_object());
        assert!(!loader.entries().contains(&"dispose thumb.glb".to_string()));
    }

    #[tokio::test]
    async fn test_failed_first_load_returns_to_empty() {
        let loader = MockLoader::new().with_failure("high.glb");
        let mut model = model_with(&[Quality::High]);
        model.activate(&loader).await;
        assert_eq!(model.state(), ModelState::Empty);
        assert_eq!(model.active_key(), None);
    }

    #[tokio::test]
    async fn test_stale_completion_discarded() {
        let loader = MockLoader::new();
        let mut model = model_with(&[Quality::Low, Quality::High]);

        let first = model.begin_load(key(Quality::Low)).unwrap();
        assert_eq!(model.state(), ModelState::Loading);
        let second = model.begin_load(key(Quality::High)).unwrap();

        let high = second.fetch(&loader).await.unwrap();
        assert!(model.complete_load(second, high));

        let low = first.fetch(&loader).await.unwrap();
        assert!(!model.complete_load(first, low));

        assert_eq!(model.active_key(), Some(key(Quality::High)));
        let entries = loader.entries();
        assert!(entries.contains(&"dispose low.glb".to_string()));
        assert!(!entries.contains(&"attach low.glb".to_string()));
        assert!(!entries.contains(&"dispose high.glb".to_string()));
    }

    #[tokio::test]
    async fn test_completion_after_dispose_discarded() {
        let loader = MockLoader::new();
        let mut model = model_with(&[Quality::High]);
        let pending = model.begin_load(key(Quality::High)).unwrap();
        model.dispose();

        let object = pending.fetch(&loader).await.unwrap();
        assert!(!model.complete_load(pending, object));
        assert!(loader.entries().contains(&"dispose high.glb".to_string()));
        assert_eq!(model.state(), ModelState::Empty);
    }

    #[tokio::test]
    async fn test_unknown_derivative() {
        let loader = MockLoader::new();
        let mut model = model_with(&[Quality::High]);
        let err = model.load_derivative(&loader, key(Quality::Low)).await.unwrap_err();
        assert!(matches!(err, VoyagerError::UnknownDerivative { .. }));
    }

    #[tokio::test]
    async fn test_events_and_bounds() {
        let bounds = BoundingBox::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));
        let loader = MockLoader::new().with_bounds("high.glb", bounds);
        let (tx, mut rx) = events::channel();
        let mut model = model_with(&[Quality::High]).with_events(tx);

        model.activate(&loader).await;

        assert_eq!(model.bounding_box(), Some(bounds));
        assert_eq!(model.bounds_frame().map(|f| f.bounds), Some(bounds));
        assert_eq!(
            rx.try_recv().unwrap(),
            SceneEvent::DerivativeChanged {
                model: model.id(),
                usage: Usage::Web,
                quality: Quality::High,
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            SceneEvent::BoundingBoxChanged { model: model.id(), bounds }
        );
    }

    #[tokio::test]
    async fn test_mesh_derivative_uses_asset_base() {
        let loader = MockLoader::new();
        let config = ViewerConfig::default().with_asset_base("https://cdn.example.org/chair");
        let mut model = ModelComponent::new().with_config(&config);
        model
            .create_mesh_derivative(
                "chair.obj",
                &[(MapType::Color, "diffuse.jpg"), (MapType::Normal, "normals.jpg")],
                Quality::High,
            )
            .unwrap();

        model.activate(&loader).await;

        let calls = loader.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.contains(&LoaderCall::Geometry("https://cdn.example.org/chair/chair.obj".into())));
        assert!(calls.contains(&LoaderCall::Texture("https://cdn.example.org/chair/normals.jpg".into())));
        assert_eq!(model.state(), ModelState::Displayed);
    }

    #[test]
    fn test_load_sequence_planning() {
        let model = model_with(&[Quality::Thumb, Quality::Medium, Quality::Highest]);
        assert_eq!(
            model.load_sequence(Quality::High),
            vec![key(Quality::Thumb), key(Quality::Highest)]
        );
        assert_eq!(model.load_sequence(Quality::Thumb), vec![key(Quality::Thumb)]);
        assert!(ModelComponent::new().load_sequence(Quality::High).is_empty());
    }

    #[test]
    fn test_unit_scale_and_matrix() {
        let mut model = ModelComponent::new();
        model.set_units(UnitType::Centimeters);
        assert!((model.unit_scale() - 0.01).abs() < 1e-12);

        model.set_global_units(UnitType::Millimeters);
        assert!((model.unit_scale() - 10.0).abs() < 1e-12);

        model.set_position(Vec3::new(1.0, 2.0, 3.0));
        let m = model.matrix();
        let origin = m.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(10.0, 20.0, 30.0)).length() < 1e-4);
        let unit = m.transform_vector3(Vec3::X);
        assert!((unit.length() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_center_uses_rotated_bounds() {
        let mut model = ModelComponent::new();
        let record = ModelRecord {
            units: UnitType::Meters,
            derivatives: Vec::new(),
            bounding_box: Some(BoundingBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 2.0, 2.0))),
            translation: None,
            rotation: Some(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)),
        };
        model.from_data(&record).unwrap();
        model.center();
        // Rotated box spans x [-2, 0], y [0, 4], z [0, 2]
        assert!((model.position() - Vec3::new(1.0, -2.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_from_data_twice_fails() {
        let mut source = model_with(&[Quality::Low, Quality::High]);
        source.set_units(UnitType::Inches);
        let record = source.to_data();

        let mut model = ModelComponent::new();
        model.from_data(&record).unwrap();
        assert_eq!(model.local_units(), UnitType::Inches);
        assert_eq!(model.derivatives().len(), 2);
        assert!(model.bounds_frame().is_none());
        assert!(matches!(model.from_data(&record), Err(VoyagerError::AlreadyPopulated)));
        assert_eq!(model.to_data(), record);
    }

    #[test]
    fn test_from_data_failure_leaves_model_empty() {
        let low = DerivativeRecord {
            usage: Usage::Web,
            quality: Quality::Low,
            assets: vec![Asset::new("low.glb", AssetType::Model)],
        };
        let high = DerivativeRecord {
            quality: Quality::High,
            assets: vec![Asset::new("high.glb", AssetType::Model)],
            ..low.clone()
        };
        let mut record = ModelRecord {
            units: UnitType::Inches,
            derivatives: vec![low.clone(), high, low],
            ..Default::default()
        };

        let mut model = ModelComponent::new();
        assert!(matches!(
            model.from_data(&record),
            Err(VoyagerError::DuplicateDerivative { usage: Usage::Web, quality: Quality::Low })
        ));
        assert!(model.derivatives().is_empty());
        assert_eq!(model.local_units(), UnitType::Meters);

        record.derivatives.pop();
        model.from_data(&record).unwrap();
        assert_eq!(model.derivatives().len(), 2);
        assert_eq!(model.local_units(), UnitType::Inches);
    }

    #[test]
    fn test_load_sequence_starts_at_lowest_available() {
        let model = model_with(&[Quality::Low, Quality::High, Quality::Lod]);
        assert_eq!(
            model.load_sequence(Quality::High),
            vec![key(Quality::Low), key(Quality::High)]
        );

        let lod_only = model_with(&[Quality::Lod]);
        assert!(lod_only.load_sequence(Quality::High).is_empty());
    }

    #[tokio::test]
    async fn test_dispose_releases_objects() {
        let loader = MockLoader::new();
        let mut model = model_with(&[Quality::High]);
        model.activate(&loader).await;
        model.dispose();
        model.dispose();
        assert!(model.is_disposed());
        assert!(model.derivatives().is_empty());
        let disposals = loader.entries().iter().filter(|e| *e == "dispose high.glb").count();
        assert_eq!(disposals, 1);
    }
}
