pub mod rta;
