use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, OVector, U1};

use crate::misc::FloatingPoint;

use super::{ControlPoints, CurveKind, NurbsCurve};

const FIELDS: &[&str] = &["order", "kind", "knots", "control_points", "weights"];

impl<T, D> serde::Serialize for NurbsCurve<T, D>
where
    T: FloatingPoint + serde::Serialize,
    D: DimName + DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let control_points: Vec<Vec<T>> = self
            .dehomogenized_control_points()
            .iter()
            .map(|p| p.coords.iter().copied().collect())
            .collect();

        let mut state = serializer.serialize_struct("NurbsCurve", FIELDS.len())?;
        state.serialize_field("order", &self.order())?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("knots", self.knots().as_slice())?;
        state.serialize_field("control_points", &control_points)?;
        state.serialize_field("weights", &self.weights())?;
        state.end()
    }
}

/// Wire shape of a curve, validated again before a curve is handed out
#[derive(serde::Deserialize)]
#[serde(rename = "NurbsCurve")]
struct NurbsCurveRepr<T> {
    order: usize,
    kind: CurveKind,
    knots: Vec<T>,
    control_points: Vec<Vec<T>>,
    weights: Option<Vec<T>>,
}

impl<'de, T, D> serde::Deserialize<'de> for NurbsCurve<T, D>
where
    T: FloatingPoint + serde::Deserialize<'de>,
    D: DimName + DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    fn deserialize<S>(deserializer: S) -> Result<Self, S::Error>
    where
        S: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        use serde::Deserialize;

        let repr = NurbsCurveRepr::<T>::deserialize(deserializer)?;
        let dim = D::dim() - 1;

        let points = repr
            .control_points
            .iter()
            .enumerate()
            .map(|(i, coords)| {
                if coords.len() == dim {
                    Ok(OPoint::from(OVector::<T, DimNameDiff<D, U1>>::from_fn(
                        |r, _| coords[r],
                    )))
                } else {
                    Err(S::Error::custom(format!(
                        "control point {} has {} coordinates, expected {}",
                        i,
                        coords.len(),
                        dim
                    )))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if repr.kind.is_rational() && repr.weights.is_none() {
            return Err(S::Error::custom(format!("{} requires weights", repr.kind)));
        }

        let control_points = ControlPoints::<T, D>::try_from_cartesian(&points, repr.weights.as_deref())
            .map_err(S::Error::custom)?;
        NurbsCurve::try_from_homogeneous(repr.order, repr.knots, control_points.to_vec(), repr.kind)
            .map_err(S::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point2;

    use crate::curve::{CurveKind, NurbsCurve2D, NurbsCurve3D};

    #[test]
    fn serializes_cartesian_points_and_weights() {
        let curve = NurbsCurve2D::try_rational(
            2,
            vec![0., 0., 1., 1.],
            &[Point2::new(1., 0.), Point2::new(0., 4.)],
            &[1., 2.],
        )
        .unwrap();
        let json = serde_json::to_value(&curve).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "order": 2,
                "kind": "Rational2D",
                "knots": [0.0, 0.0, 1.0, 1.0],
                "control_points": [[1.0, 0.0], [0.0, 4.0]],
                "weights": [1.0, 2.0],
            })
        );
    }

    #[test]
    fn deserialization_validates() {
        // interior knot decreases
        let json = r#"{
            "order": 2,
            "kind": "Polynomial2D",
            "knots": [0.0, 0.5, 0.2, 1.0],
            "control_points": [[0.0, 0.0], [1.0, 1.0]],
            "weights": null
        }"#;
        assert!(serde_json::from_str::<NurbsCurve2D<f64>>(json).is_err());

        // three coordinates for a 2D curve
        let json = r#"{
            "order": 2,
            "kind": "Polynomial2D",
            "knots": [0.0, 0.0, 1.0, 1.0],
            "control_points": [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]],
            "weights": null
        }"#;
        assert!(serde_json::from_str::<NurbsCurve2D<f64>>(json).is_err());

        // 2D kind for a 3D curve
        let json = r#"{
            "order": 2,
            "kind": "Polynomial2D",
            "knots": [0.0, 0.0, 1.0, 1.0],
            "control_points": [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]],
            "weights": null
        }"#;
        assert!(serde_json::from_str::<NurbsCurve3D<f64>>(json).is_err());
    }

    #[test]
    fn polynomial_without_weights() {
        let json = r#"{
            "order": 2,
            "kind": "Polynomial2D",
            "knots": [0.0, 0.0, 1.0, 1.0],
            "control_points": [[0.0, 0.0], [1.0, 1.0]],
            "weights": null
        }"#;
        let curve: NurbsCurve2D<f64> = serde_json::from_str(json).unwrap();
        assert_eq!(curve.kind(), CurveKind::Polynomial2D);
        assert_eq!(curve.point_at(0.5).unwrap(), Point2::new(0.5, 0.5));
    }
}
