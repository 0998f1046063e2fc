pub mod view_faces_use_case;
