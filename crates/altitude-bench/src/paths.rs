use glam::Vec3;

/// A scripted viewer: constant velocity from a start point.
pub struct ViewerPath {
    pub name: &'static str,
    pub start: [f32; 3],
    /// World units per second.
    pub velocity: [f32; 3],
}

impl ViewerPath {
    pub fn position_at(&self, t: f32) -> Vec3 {
        Vec3::from_array(self.start) + Vec3::from_array(self.velocity) * t
    }
}

/// The standard suite: idle, walking, flying and a fast traverse that keeps
/// the completion queue saturated.
pub fn standard_paths() -> Vec<ViewerPath> {
    vec![
        ViewerPath {
            name: "idle",
            start: [0.0, 0.0, 0.0],
            velocity: [0.0, 0.0, 0.0],
        },
        ViewerPath {
            name: "walk",
            start: [0.0, 2.0, 0.0],
            velocity: [6.0, 0.0, 0.0],
        },
        ViewerPath {
            name: "diagonal",
            start: [0.0, 8.0, 0.0],
            velocity: [12.0, 0.0, 12.0],
        },
        ViewerPath {
            name: "descent",
            start: [0.0, 64.0, 0.0],
            velocity: [4.0, -8.0, 0.0],
        },
        ViewerPath {
            name: "sprint",
            start: [0.0, 0.0, 0.0],
            velocity: [64.0, 0.0, -16.0],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_is_linear_in_time() {
        let path = ViewerPath {
            name: "t",
            start: [1.0, 2.0, 3.0],
            velocity: [2.0, 0.0, -1.0],
        };
        assert_eq!(path.position_at(0.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(path.position_at(1.5), Vec3::new(4.0, 2.0, 1.5));
    }

    #[test]
    fn test_standard_path_names_unique() {
        let paths = standard_paths();
        let mut names: Vec<_> = paths.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), paths.len());
    }
}
