use num_traits::Float;
use kura_core::solver::{LinAlg, Prox, SolverError};
use kura_core::{Fun1D, Coef, Coeffs1D, Prox1D, ProxNorm2, ProxIndSimplex, ProxIndBall2,
                ProxQuadDiag, ProxSingularNx2, ProxMoreau, ProxPermute, ProxTransform};

//

/// Owned counterpart of a [`Coef`] coefficient.
#[derive(Debug, Clone)]
pub enum CoefDesc<F: Float>
{
    /// One value for the whole range.
    Scal(F),
    /// One value per coordinate (or per group for grouped operators).
    PerElem(Vec<F>),
}

impl<F: Float> CoefDesc<F>
{
    fn as_coef(&self) -> Coef<'_, F>
    {
        match self {
            CoefDesc::Scal(v) => Coef::Scal(*v),
            CoefDesc::PerElem(v) => Coef::PerElem(v),
        }
    }
}

/// Owned counterpart of a [`Coeffs1D`] coefficient pack.
#[derive(Debug, Clone)]
pub struct CoeffsDesc<F: Float>
{
    pub a: CoefDesc<F>,
    pub b: CoefDesc<F>,
    pub c: CoefDesc<F>,
    pub d: CoefDesc<F>,
    pub e: CoefDesc<F>,
    pub alpha: F,
    pub beta: F,
}

impl<F: Float> Default for CoeffsDesc<F>
{
    fn default() -> Self
    {
        let f0 = F::zero();
        let f1 = F::one();

        CoeffsDesc {
            a: CoefDesc::Scal(f1),
            b: CoefDesc::Scal(f0),
            c: CoefDesc::Scal(f1),
            d: CoefDesc::Scal(f0),
            e: CoefDesc::Scal(f0),
            alpha: f0,
            beta: f0,
        }
    }
}

impl<F: Float> CoeffsDesc<F>
{
    fn as_coeffs(&self) -> Coeffs1D<'_, F>
    {
        Coeffs1D {
            a: self.a.as_coef(),
            b: self.b.as_coef(),
            c: self.c.as_coef(),
            d: self.d.as_coef(),
            e: self.e.as_coef(),
            alpha: self.alpha,
            beta: self.beta,
        }
    }
}

//

/// Owned description of one proximal operator.
///
/// The typed counterpart of a prox entry in a host parameter dictionary.
/// Wrappers nest their inner description, so a description is a small
/// ownership tree without cycles; the matching [`kura_core`] operators
/// borrowing the owned data are materialized per solve.
#[derive(Debug, Clone)]
pub enum ProxDesc<F: Float>
{
    /// Separable 1D prox of a scalar function.
    Fun1D {index: usize, size: usize, fun: Fun1D, cf: CoeffsDesc<F>},
    /// Euclidean-norm grouped prox.
    Norm2 {index: usize, size: usize, group: usize, fun: Fun1D, cf: CoeffsDesc<F>},
    /// Projection onto the standard simplex, per group.
    IndSimplex {index: usize, size: usize, group: usize, radius: F},
    /// Projection onto the Euclidean ball, per group.
    IndBall2 {index: usize, size: usize, group: usize, radius: F},
    /// Quadratic with diagonal Hessian.
    QuadDiag {index: usize, size: usize, hess: Vec<F>, lin: Vec<F>},
    /// Singular-value prox of N x 2 matrix groups.
    SingularNx2 {index: usize, size: usize, nrows: usize, fun: Fun1D, cf: CoeffsDesc<F>},
    /// Moreau conjugation of the inner prox.
    Moreau {inner: Box<ProxDesc<F>>},
    /// Inner prox through an index permutation.
    Permute {perm: Vec<usize>, inner: Box<ProxDesc<F>>},
    /// Affine coefficient transform of the inner prox.
    Transform {a: F, b: F, c: F, d: F, e: F, inner: Box<ProxDesc<F>>},
}

impl<F: Float> ProxDesc<F>
{
    /// First index of the range the described operator acts on.
    pub fn index(&self) -> usize
    {
        match self {
            ProxDesc::Fun1D {index, ..} => *index,
            ProxDesc::Norm2 {index, ..} => *index,
            ProxDesc::IndSimplex {index, ..} => *index,
            ProxDesc::IndBall2 {index, ..} => *index,
            ProxDesc::QuadDiag {index, ..} => *index,
            ProxDesc::SingularNx2 {index, ..} => *index,
            ProxDesc::Moreau {inner} => inner.index(),
            ProxDesc::Permute {inner, ..} => inner.index(),
            ProxDesc::Transform {inner, ..} => inner.index(),
        }
    }

    /// Length of the range the described operator acts on.
    pub fn size(&self) -> usize
    {
        match self {
            ProxDesc::Fun1D {size, ..} => *size,
            ProxDesc::Norm2 {size, ..} => *size,
            ProxDesc::IndSimplex {size, ..} => *size,
            ProxDesc::IndBall2 {size, ..} => *size,
            ProxDesc::QuadDiag {size, ..} => *size,
            ProxDesc::SingularNx2 {size, ..} => *size,
            ProxDesc::Moreau {inner} => inner.size(),
            ProxDesc::Permute {inner, ..} => inner.size(),
            ProxDesc::Transform {inner, ..} => inner.size(),
        }
    }

    pub(crate) fn build<'a, L>(&'a self, eps_zero: F) -> Result<Box<dyn Prox<L> + 'a>, SolverError>
    where L: LinAlg<F=F> + 'a
    {
        let p: Box<dyn Prox<L> + '_> = match self {
            ProxDesc::Fun1D {index, size, fun, cf} => {
                Box::new(Prox1D::new(*index, *size, *fun, cf.as_coeffs())?)
            },
            ProxDesc::Norm2 {index, size, group, fun, cf} => {
                Box::new(ProxNorm2::new(*index, *size, *group, *fun, cf.as_coeffs())?)
            },
            ProxDesc::IndSimplex {index, size, group, radius} => {
                Box::new(ProxIndSimplex::new(*index, *size, *group, *radius)?)
            },
            ProxDesc::IndBall2 {index, size, group, radius} => {
                Box::new(ProxIndBall2::new(*index, *size, *group, *radius)?)
            },
            ProxDesc::QuadDiag {index, size, hess, lin} => {
                Box::new(ProxQuadDiag::new(*index, *size, hess, lin)?)
            },
            ProxDesc::SingularNx2 {index, size, nrows, fun, cf} => {
                Box::new(ProxSingularNx2::new(*index, *size, *nrows, *fun, cf.as_coeffs(), eps_zero)?)
            },
            ProxDesc::Moreau {inner} => {
                Box::new(ProxMoreau::new(inner.build(eps_zero)?))
            },
            ProxDesc::Permute {perm, inner} => {
                Box::new(ProxPermute::new(inner.build(eps_zero)?, perm)?)
            },
            ProxDesc::Transform {a, b, c, d, e, inner} => {
                Box::new(ProxTransform::new(inner.build(eps_zero)?, *a, *b, *c, *d, *e)?)
            },
        };

        Ok(p)
    }
}
