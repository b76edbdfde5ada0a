//! The covariance matrix of the search distribution and its eigendecomposition

use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// The covariance matrix is not positive definite (or its eigendecomposition did not converge)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct PosDefCovError;

/// A symmetric matrix `C` that stores its eigendecomposition `C = B D^2 B^T` and inverse square
/// root `C^(-1/2)`
#[derive(Clone, Debug)]
pub(super) struct CovarianceMatrix {
    cov: DMatrix<f64>,
    /// Columns are normalized eigenvectors (`B`)
    eigenvectors: DMatrix<f64>,
    /// Square roots of the eigenvalues (the diagonal of `D`)
    sqrt_eigenvalues: DVector<f64>,
    sqrt_inv: DMatrix<f64>,
}

impl CovarianceMatrix {
    /// Returns an identity `CovarianceMatrix`
    pub fn new(dim: usize) -> Self {
        Self {
            cov: DMatrix::identity(dim, dim),
            eigenvectors: DMatrix::identity(dim, dim),
            sqrt_eigenvalues: DVector::from_element(dim, 1.0),
            sqrt_inv: DMatrix::identity(dim, dim),
        }
    }

    pub fn cov(&self) -> &DMatrix<f64> {
        &self.cov
    }

    pub fn eigenvectors(&self) -> &DMatrix<f64> {
        &self.eigenvectors
    }

    pub fn sqrt_eigenvalues(&self) -> &DVector<f64> {
        &self.sqrt_eigenvalues
    }

    pub fn sqrt_inv(&self) -> &DMatrix<f64> {
        &self.sqrt_inv
    }

    /// Transforms a sample from `N(0, I)` into a sample from `N(0, C)`
    pub fn transform(&self, z: &DVector<f64>) -> DVector<f64> {
        &self.eigenvectors * z.component_mul(&self.sqrt_eigenvalues)
    }

    /// Returns the ratio of the longest to the shortest axis of the distribution
    pub fn axis_ratio(&self) -> f64 {
        self.sqrt_eigenvalues.max() / self.sqrt_eigenvalues.min()
    }

    /// Replaces the matrix, symmetrizes it, and updates the eigendecomposition if `update_eigen`
    /// is true
    ///
    /// Returns `Err` if the matrix is not positive definite
    pub fn set_cov(&mut self, new: DMatrix<f64>, update_eigen: bool) -> Result<(), PosDefCovError> {
        self.cov = new;
        self.cov.fill_lower_triangle_with_upper_triangle();

        if update_eigen {
            self.update_eigendecomposition()?;
        }
        Ok(())
    }

    fn update_eigendecomposition(&mut self) -> Result<(), PosDefCovError> {
        if self.cov.iter().any(|x| !x.is_finite()) {
            return Err(PosDefCovError);
        }

        let mut eigen =
            SymmetricEigen::try_new(self.cov.clone(), f64::EPSILON, 0).ok_or(PosDefCovError)?;

        // NAN eigenvalues are also rejected
        if eigen.eigenvalues.iter().any(|x| !(*x > 0.0)) {
            return Err(PosDefCovError);
        }

        for mut col in eigen.eigenvectors.column_iter_mut() {
            col.normalize_mut();
        }

        self.sqrt_eigenvalues = eigen.eigenvalues.map(|x| x.sqrt());
        self.sqrt_inv = &eigen.eigenvectors
            * DMatrix::from_diagonal(&self.sqrt_eigenvalues.map(|d| 1.0 / d))
            * eigen.eigenvectors.transpose();
        self.eigenvectors = eigen.eigenvectors;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn test_eigendecomposition() {
        let mut cov = CovarianceMatrix::new(2);
        let matrix = DMatrix::from_row_slice(2, 2, &[3.0, 1.5, 1.5, 2.0]);
        cov.set_cov(matrix.clone(), true).unwrap();

        let d2 = DMatrix::from_diagonal(&cov.sqrt_eigenvalues().map(|x| x.powi(2)));
        let reconstructed = cov.eigenvectors() * d2 * cov.eigenvectors().transpose();
        for x in (reconstructed - &matrix).iter() {
            assert_approx_eq!(0.0, x, 1e-12);
        }

        let identity = cov.sqrt_inv() * &matrix * cov.sqrt_inv();
        for (x, y) in identity.iter().zip(DMatrix::<f64>::identity(2, 2).iter()) {
            assert_approx_eq!(y, x, 1e-12);
        }
    }

    #[test]
    fn test_symmetrize() {
        let mut cov = CovarianceMatrix::new(2);
        cov.set_cov(DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.0, 1.0]), false)
            .unwrap();

        assert_eq!(0.5, cov.cov()[(1, 0)]);
        // The eigendecomposition is unchanged until requested
        assert_eq!(&DMatrix::<f64>::identity(2, 2), cov.eigenvectors());
    }

    #[test]
    fn test_not_positive_definite() {
        let mut cov = CovarianceMatrix::new(2);

        assert_eq!(
            Err(PosDefCovError),
            cov.set_cov(DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]), true),
        );
        assert_eq!(
            Err(PosDefCovError),
            cov.set_cov(DMatrix::from_element(2, 2, f64::NAN), true),
        );
    }

    #[test]
    fn test_transform() {
        let mut cov = CovarianceMatrix::new(2);
        cov.set_cov(DMatrix::from_diagonal(&DVector::from(vec![4.0, 9.0])), true)
            .unwrap();
        let y = cov.transform(&DVector::from(vec![1.0, 1.0]));

        // Each axis is scaled by its standard deviation
        assert_approx_eq!(2.0, y[0].abs(), 1e-12);
        assert_approx_eq!(3.0, y[1].abs(), 1e-12);
        assert_approx_eq!(1.5, cov.axis_ratio(), 1e-12);
    }
}
