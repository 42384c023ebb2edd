// Change notification for camera mutations

use std::fmt;

use crate::camera::Camera;

/// An observable camera property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Transform,
    TargetPoint,
    Aperture,
    Focal,
    Orthographic,
    ClipMin,
    ClipMax,
    UpDirection,
}

impl Property {
    pub const fn name(self) -> &'static str {
        match self {
            Property::Transform => "transform",
            Property::TargetPoint => "target_point",
            Property::Aperture => "aperture",
            Property::Focal => "focal",
            Property::Orthographic => "orthographic",
            Property::ClipMin => "clip_min",
            Property::ClipMax => "clip_max",
            Property::UpDirection => "up_direction",
        }
    }

    /// Event name published for a change, e.g. `"aperture-changed"`.
    pub const fn event_name(self) -> &'static str {
        match self {
            Property::Transform => "transform-changed",
            Property::TargetPoint => "target_point-changed",
            Property::Aperture => "aperture-changed",
            Property::Focal => "focal-changed",
            Property::Orthographic => "orthographic-changed",
            Property::ClipMin => "clip_min-changed",
            Property::ClipMax => "clip_max-changed",
            Property::UpDirection => "up_direction-changed",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives camera changes.
///
/// Observers must not mutate the source camera from inside [`ChangeObserver::changed`].
pub trait ChangeObserver {
    fn changed(&mut self, source: &Camera, property: Property);
}

impl<F> ChangeObserver for F
where
    F: FnMut(&Camera, Property),
{
    fn changed(&mut self, source: &Camera, property: Property) {
        self(source, property)
    }
}

/// Properties changed by one mutation, in emission order, without repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changed: Vec<Property>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Self::insert`].
    #[must_use]
    pub fn with(mut self, property: Property) -> Self {
        self.insert(property);
        self
    }

    /// Builder form of [`Self::insert`], only when `condition` holds.
    #[must_use]
    pub fn with_if(self, condition: bool, property: Property) -> Self {
        if condition {
            self.with(property)
        } else {
            self
        }
    }

    pub fn insert(&mut self, property: Property) {
        if !self.changed.contains(&property) {
            self.changed.push(property);
        }
    }

    /// Append the changes of a later mutation.
    pub fn merge(&mut self, other: ChangeSet) {
        for property in other.changed {
            self.insert(property);
        }
    }

    pub fn contains(&self, property: Property) -> bool {
        self.changed.contains(&property)
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changed.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Property> + '_ {
        self.changed.iter().copied()
    }

    pub fn event_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.iter().map(Property::event_name)
    }

    /// Deliver every change to `observer`, in order.
    pub fn notify<O>(&self, source: &Camera, observer: &mut O)
    where
        O: ChangeObserver + ?Sized,
    {
        for property in self.iter() {
            log::trace!("{}", property.event_name());
            observer.changed(source, property);
        }
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = Property;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Property>>;

    fn into_iter(self) -> Self::IntoIter {
        self.changed.iter().copied()
    }
}
